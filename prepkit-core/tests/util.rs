#[cfg(test)]
mod tests {
    use prepkit_core::{backend_statement_name, truncate_long, truncate_on_char_boundary};

    #[test]
    fn truncate_short_text() {
        assert_eq!(truncate_on_char_boundary("SELECT 1", 497), "SELECT 1");
        assert_eq!(format!("{}", truncate_long!("SELECT 1")), "SELECT 1\n");
    }

    #[test]
    fn truncate_multibyte_text() {
        // 'é' takes bytes 496 and 497
        let query = format!("EXECUTE echo('{}é')", "a".repeat(482));
        let truncated = truncate_on_char_boundary(&query, 497);
        assert_eq!(truncated.len(), 496);
        assert!(truncated.ends_with('a'));
        let message = format!("{}", truncate_long!(query));
        assert!(message.ends_with("a...\n"), "{message}");

        let query = "é".repeat(400);
        assert_eq!(truncate_on_char_boundary(&query, 497).len(), 496);
        assert_eq!(truncate_on_char_boundary(&query, 1), "");
    }

    #[test]
    fn backend_names() {
        assert_eq!(backend_statement_name("by_id"), "by_id");
        assert_eq!(
            backend_statement_name("zoo::queries::Species_By_Id"),
            "zoo__queries__species_by_id"
        );
        assert_eq!(backend_statement_name("zoo.queries.by_id"), "zoo__queries__by_id");
    }
}
