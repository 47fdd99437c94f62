use super::{element_text, CELL, ROW};
use scraper::{Html, Selector};
use std::sync::LazyLock;

/// Column header row plus the summary row printed above the listing.
pub const DEFAULT_HEADER_ROWS: usize = 2;

static ROSTER_TABLE: LazyLock<Selector> = LazyLock::new(|| super::selector("table.tabi"));

/// Names from the "who is online" listing, in page order.
///
/// `None` means the listing table is missing altogether; `Some(vec![])`
/// means the table is there but nobody is online.
pub fn extract_online_roster(document: &Html, header_rows: usize) -> Option<Vec<String>> {
    let table = document.select(&ROSTER_TABLE).next()?;

    let names = table
        .select(&ROW)
        .skip(header_rows)
        .filter_map(|row| row.select(&CELL).next())
        .map(element_text)
        .filter(|name| !name.is_empty())
        .collect();

    Some(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(html: &str) -> Option<Vec<String>> {
        extract_online_roster(&Html::parse_document(html), DEFAULT_HEADER_ROWS)
    }

    #[test]
    fn test_lists_online_characters() {
        let html = r#"
            <html>
                <body>
                    <table class="tabi">
                        <tr><th>Header1</th><th>Header2</th></tr>
                        <tr><td>Some info</td><td>More info</td></tr>
                        <tr><td>Character1</td><td>Knight, Level 100</td></tr>
                        <tr><td>Character2</td><td>Paladin, Level 85</td></tr>
                        <tr><td>Character3</td><td>Sorcerer, Level 120</td></tr>
                    </table>
                </body>
            </html>
        "#;

        assert_eq!(
            extract(html).unwrap(),
            vec!["Character1", "Character2", "Character3"]
        );
    }

    #[test]
    fn test_header_only_is_empty() {
        let html = r#"<table class="tabi"><tr><th>Header1</th><th>Header2</th></tr></table>"#;
        assert_eq!(extract(html), Some(vec![]));
    }

    #[test]
    fn test_missing_table_is_absent() {
        assert_eq!(extract("<html><body></body></html>"), None);
        assert_eq!(
            extract("<table><tr><td>a</td></tr><tr><td>b</td></tr><tr><td>c</td></tr></table>"),
            None
        );
    }

    #[test]
    fn test_duplicates_are_kept() {
        let html = r#"
            <table class="tabi">
                <tr><td>Name</td></tr>
                <tr><td>2 players online</td></tr>
                <tr><td> Twin </td><td>Druid</td></tr>
                <tr><td></td></tr>
                <tr><td>Twin</td><td>Druid</td></tr>
            </table>
        "#;
        assert_eq!(extract(html).unwrap(), vec!["Twin", "Twin"]);
    }

    #[test]
    fn test_custom_header_rows() {
        let html = r#"
            <table class="tabi">
                <tr><th>Name</th></tr>
                <tr><td>Solo</td></tr>
            </table>
        "#;
        let document = Html::parse_document(html);
        assert_eq!(extract_online_roster(&document, 1).unwrap(), vec!["Solo"]);
    }
}
