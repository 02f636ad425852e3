// status.rs - completion lines shown to the operator after init-db

use database::BootstrapSummary;

const MASKED: &str = "********";

/// `admin_ui` is printed as configured, after it has been validated as a URI.
pub fn completion_lines(summary: &BootstrapSummary, admin_ui: &str) -> Vec<String> {
    vec![
        "MongoDB initialization complete".to_string(),
        format!("Database: {}", summary.database),
        format!("Application user: {}", summary.username),
        format!("Application password: {} (from APP_DB_PASSWORD)", MASKED),
        format!("Indexes declared: {}", summary.index_count),
        format!("Admin interface: {}", admin_ui),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> BootstrapSummary {
        BootstrapSummary {
            database: "ai_agent_db".to_string(),
            username: "ai_agent_user".to_string(),
            index_count: 8,
        }
    }

    #[test]
    fn mentions_database_and_user() {
        let lines = completion_lines(&summary(), "http://localhost:8081");
        assert!(lines.iter().any(|l| l.contains("ai_agent_db")));
        assert!(lines.iter().any(|l| l.contains("ai_agent_user")));
    }

    #[test]
    fn admin_url_is_printed_as_configured() {
        let lines = completion_lines(&summary(), "http://localhost:8081");
        assert_eq!(
            lines.last().map(String::as_str),
            Some("Admin interface: http://localhost:8081")
        );
    }

    #[test]
    fn never_prints_a_password() {
        let lines = completion_lines(&summary(), "http://localhost:8081");
        let password_line = lines
            .iter()
            .find(|l| l.starts_with("Application password"))
            .unwrap();
        assert!(password_line.contains(MASKED));
    }
}
