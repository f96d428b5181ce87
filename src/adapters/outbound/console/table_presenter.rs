use crate::application::read_models::{ContentState, EmptyState, ListViewSnapshot, RowViewModel};
use crate::ports::outbound::ViewPresenter;
use crate::shared::Result;
use std::fmt::Write as _;

const NAME_WIDTH: usize = 28;
const DESCRIPTION_WIDTH: usize = 40;

/// TablePresenter adapter rendering a list snapshot as a plain-text table on stdout
pub struct TablePresenter;

impl TablePresenter {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, snapshot: &ListViewSnapshot) -> String {
        let mut out = String::new();
        let class = snapshot.resource_class.as_str();

        match snapshot.content {
            ContentState::Loading => {
                let _ = writeln!(out, "Loading {}...", class);
                return out;
            }
            ContentState::Forbidden => {
                let _ = writeln!(out, "You are not allowed to read {}.", class);
                return out;
            }
            ContentState::Unavailable => {
                let reason = snapshot.last_error.as_deref().unwrap_or("unknown error");
                let _ = writeln!(out, "Could not load {}: {}", class, reason);
                return out;
            }
            ContentState::Empty(EmptyState::NoData) => {
                let _ = writeln!(out, "You don't have any {} yet.", class);
                return out;
            }
            ContentState::Empty(EmptyState::NoMatches) => {
                let _ = writeln!(out, "No {} match the search.", class);
                return out;
            }
            ContentState::Rows => {}
        }

        let _ = writeln!(
            out,
            "{:<8} {:<name$} {:<desc$} {:<10} ACTIONS",
            "ID",
            "NAME",
            "DESCRIPTION",
            "USERS",
            name = NAME_WIDTH,
            desc = DESCRIPTION_WIDTH
        );
        for row in &snapshot.rows {
            let _ = writeln!(out, "{}", Self::render_row(row));
        }

        let _ = write!(out, "{} shown", snapshot.rows.len());
        if let Some(pagination) = snapshot.pagination {
            if pagination.page_count() > 1 {
                let _ = write!(
                    out,
                    " (page {} of {}, {} total)",
                    pagination.page,
                    pagination.page_count(),
                    pagination.total
                );
            }
        }
        if snapshot.is_stale {
            out.push_str(" [stale]");
        }
        if let Some(error) = &snapshot.last_error {
            let _ = write!(out, " [last refresh failed: {}]", error);
        }
        out.push('\n');
        out
    }

    fn render_row(row: &RowViewModel) -> String {
        let mut actions = Vec::new();
        if row.can_edit {
            actions.push("edit");
        }
        if row.can_delete {
            actions.push("delete");
        }
        if row.is_immutable {
            actions.push("built-in");
        }
        let users = row
            .users_count
            .map(|count| count.label())
            .unwrap_or_default();

        format!(
            "{:<8} {:<name$} {:<desc$} {:<10} {}",
            row.id.as_str(),
            truncate(&row.name, NAME_WIDTH),
            truncate(&row.description, DESCRIPTION_WIDTH),
            users,
            actions.join(","),
            name = NAME_WIDTH,
            desc = DESCRIPTION_WIDTH
        )
    }
}

impl Default for TablePresenter {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewPresenter for TablePresenter {
    fn present(&self, snapshot: &ListViewSnapshot) -> Result<()> {
        print!("{}", self.render(snapshot));
        Ok(())
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::read_models::UsersCount;
    use crate::collections::domain::{
        Pagination, PermissionSet, QuerySignature, ResourceClass, ResourceId, SearchMode,
    };
    use crate::collections::services::ConfirmationState;
    use std::collections::{BTreeMap, BTreeSet};

    fn snapshot(content: ContentState, rows: Vec<RowViewModel>) -> ListViewSnapshot {
        let class = ResourceClass::new("roles").unwrap();
        ListViewSnapshot {
            resource_class: class.clone(),
            signature: QuerySignature::new(class),
            search_mode: SearchMode::Client,
            search_text: String::new(),
            content,
            rows,
            pagination: None,
            permissions: PermissionSet::allowed(),
            can_create: true,
            is_loading: false,
            is_stale: false,
            last_error: None,
            confirmation: ConfirmationState::default(),
            selected: BTreeSet::new(),
        }
    }

    fn row(id: &str, name: &str, immutable: bool) -> RowViewModel {
        RowViewModel {
            id: ResourceId::from(id),
            name: name.to_string(),
            description: String::new(),
            metadata: BTreeMap::new(),
            users_count: Some(UsersCount::One),
            is_immutable: immutable,
            can_edit: !immutable,
            can_delete: !immutable,
            is_selected: false,
        }
    }

    #[test]
    fn test_rows_render_with_actions() {
        let presenter = TablePresenter::new();
        let out = presenter.render(&snapshot(
            ContentState::Rows,
            vec![row("1", "Editor", false), row("2", "Public", true)],
        ));
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines[0].starts_with("ID"));
        assert!(lines[1].contains("Editor"));
        assert!(lines[1].contains("1 user"));
        assert!(lines[1].ends_with("edit,delete"));
        assert!(lines[2].ends_with("built-in"));
        assert_eq!(lines[3], "2 shown");
    }

    #[test]
    fn test_empty_states_have_distinct_messages() {
        let presenter = TablePresenter::new();
        let no_data = presenter.render(&snapshot(ContentState::Empty(EmptyState::NoData), vec![]));
        let no_matches =
            presenter.render(&snapshot(ContentState::Empty(EmptyState::NoMatches), vec![]));
        assert_eq!(no_data, "You don't have any roles yet.\n");
        assert_eq!(no_matches, "No roles match the search.\n");
    }

    #[test]
    fn test_forbidden_message() {
        let out = TablePresenter::new().render(&snapshot(ContentState::Forbidden, vec![]));
        assert!(out.contains("not allowed to read roles"));
    }

    #[test]
    fn test_pagination_footer() {
        let mut snapshot = snapshot(ContentState::Rows, vec![row("1", "Ann", false)]);
        snapshot.pagination = Some(Pagination::new(25, 2, 10));
        snapshot.is_stale = true;
        let out = TablePresenter::new().render(&snapshot);
        assert!(out.contains("1 shown (page 2 of 3, 25 total) [stale]"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
    }
}
