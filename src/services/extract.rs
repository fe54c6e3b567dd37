// src/services/extract.rs

//! Field extraction from announcement pages.
//!
//! Two strategies over the same [`DocumentTree`]:
//! - keyed: `th` header cells name the field, the last sibling element holds the value
//! - positional: in lot rows the column index names the field
//!
//! Both are pure functions of the document and the fixed tables below.

use regex::Regex;

use crate::document::{DocumentTree, TreeNode};
use crate::models::{Announcement, Lot};

/// Header cell label of the lots table; a row carrying it as a name is the header itself.
pub const LOT_HEADER_LABEL: &str = "Наименование";

/// Announcement field addressed by a header label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderField {
    Organization,
    Address,
    ContactName,
    ContactPhone,
    ContactEmail,
}

/// Header labels as printed on the announcement page.
pub const HEADER_FIELDS: &[(&str, HeaderField)] = &[
    ("Организатор", HeaderField::Organization),
    ("Юр. адрес организатора", HeaderField::Address),
    ("ФИО представителя", HeaderField::ContactName),
    ("Контактный телефон", HeaderField::ContactPhone),
    ("E-Mail", HeaderField::ContactEmail),
];

/// Lot field addressed by a column index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LotColumn {
    Name,
    Description,
    PricePerUnit,
    Amount,
}

/// Column layout of the lots table.
pub const LOT_COLUMNS: &[(usize, LotColumn)] = &[
    (3, LotColumn::Name),
    (4, LotColumn::Description),
    (5, LotColumn::PricePerUnit),
    (6, LotColumn::Amount),
];

impl HeaderField {
    /// Look up a header label. Exact, case-sensitive match.
    pub fn from_label(label: &str) -> Option<Self> {
        HEADER_FIELDS
            .iter()
            .find(|(known, _)| *known == label)
            .map(|(_, field)| *field)
    }

    pub fn apply(self, announce: &mut Announcement, value: String) {
        match self {
            HeaderField::Organization => announce.general_info.organization = value,
            HeaderField::Address => announce.general_info.address = value,
            HeaderField::ContactName => announce.organizer.name = value,
            HeaderField::ContactPhone => announce.organizer.phone = value,
            HeaderField::ContactEmail => announce.organizer.email = value,
        }
    }
}

impl LotColumn {
    pub fn from_index(index: usize) -> Option<Self> {
        LOT_COLUMNS
            .iter()
            .find(|(known, _)| *known == index)
            .map(|(_, column)| *column)
    }

    pub fn apply(self, lot: &mut Lot, value: String) {
        match self {
            LotColumn::Name => lot.name = value,
            LotColumn::Description => lot.description = value,
            LotColumn::PricePerUnit => lot.price_per_unit = value,
            LotColumn::Amount => lot.amount = value,
        }
    }
}

/// Fill announcement header fields from every `th` cell of the page.
///
/// The value of a header is the text of the last sibling element in its row,
/// looking both before and after the header cell, or empty when it has none.
/// Unknown labels are skipped.
pub fn apply_header_fields<D: DocumentTree>(document: &D, announce: &mut Announcement) {
    for cell in document.find_by_tag("th") {
        let label = cell.text_content();
        let Some(field) = HeaderField::from_label(label.trim()) else {
            continue;
        };
        let value = cell
            .sibling_elements()
            .last()
            .map(|sibling| sibling.text_content().trim().to_string())
            .unwrap_or_default();
        field.apply(announce, value);
    }
}

/// Collect lot rows from every `tbody` of the lots page.
pub fn extract_lots<D: DocumentTree>(document: &D) -> Vec<Lot> {
    let mut lots = Vec::new();
    for body in document.find_by_tag("tbody") {
        for row in body.child_elements() {
            let lot = parse_lot_row(&row);
            if is_lot_row(&lot) {
                lots.push(lot);
            }
        }
    }
    lots
}

fn parse_lot_row<N: TreeNode>(row: &N) -> Lot {
    let mut lot = Lot::default();
    for (index, cell) in row.child_elements().iter().enumerate() {
        if let Some(column) = LotColumn::from_index(index) {
            column.apply(&mut lot, cell.text_content().trim().to_string());
        }
    }
    lot
}

fn is_lot_row(lot: &Lot) -> bool {
    !lot.name.is_empty() && lot.name != LOT_HEADER_LABEL
}

/// Announcement link paths on a search-results page, in document order.
///
/// Only anchors count. Duplicates are kept; the ledger decides what has been seen.
pub fn extract_announce_links<D: DocumentTree>(document: &D, pattern: &Regex) -> Vec<String> {
    document
        .find_by_attr("a", "href", |href| pattern.is_match(href))
        .iter()
        .filter_map(|anchor| anchor.attribute("href"))
        .collect()
}

#[cfg(test)]
mod tests {
    use scraper::Html;

    use super::*;

    fn header_page(rows: &str) -> Html {
        Html::parse_document(&format!(
            "<html><body><table><tbody>{rows}</tbody></table></body></html>"
        ))
    }

    fn lot_row(cells: [&str; 7]) -> String {
        let tds: String = cells.iter().map(|c| format!("<td>{c}</td>")).collect();
        format!("<tr>{tds}</tr>")
    }

    fn blank() -> Announcement {
        Announcement::new("https://example.com/ru/announce/index/1")
    }

    #[test]
    fn test_organizer_header_maps_to_organization() {
        let doc = header_page("<tr><th>Организатор</th><td>ACME Corp</td></tr>");
        let mut announce = blank();
        apply_header_fields(&doc, &mut announce);
        assert_eq!(announce.general_info.organization, "ACME Corp");
    }

    #[test]
    fn test_all_known_headers() {
        let doc = header_page(
            "<tr><th>Организатор</th><td>ACME Corp</td></tr>
             <tr><th>Юр. адрес организатора</th><td>Астана</td></tr>
             <tr><th>ФИО представителя</th><td>Иванов И.И.</td></tr>
             <tr><th>Контактный телефон</th><td>+7 700 000 00 00</td></tr>
             <tr><th>E-Mail</th><td>ivanov@example.com</td></tr>",
        );
        let mut announce = blank();
        apply_header_fields(&doc, &mut announce);

        assert_eq!(announce.general_info.organization, "ACME Corp");
        assert_eq!(announce.general_info.address, "Астана");
        assert_eq!(announce.organizer.name, "Иванов И.И.");
        assert_eq!(announce.organizer.phone, "+7 700 000 00 00");
        assert_eq!(announce.organizer.email, "ivanov@example.com");
    }

    #[test]
    fn test_unknown_header_changes_nothing() {
        let doc = header_page("<tr><th>Способ закупки</th><td>Запрос ценовых предложений</td></tr>");
        let mut announce = blank();
        let before = announce.clone();
        apply_header_fields(&doc, &mut announce);
        assert_eq!(announce, before);
    }

    #[test]
    fn test_header_label_is_case_sensitive() {
        let doc = header_page("<tr><th>e-mail</th><td>ivanov@example.com</td></tr>");
        let mut announce = blank();
        apply_header_fields(&doc, &mut announce);
        assert!(announce.organizer.email.is_empty());
    }

    #[test]
    fn test_last_sibling_wins() {
        let doc = header_page("<tr><th>Организатор</th><td>First</td><td>Second</td></tr>");
        let mut announce = blank();
        apply_header_fields(&doc, &mut announce);
        assert_eq!(announce.general_info.organization, "Second");
    }

    #[test]
    fn test_header_in_last_column_reads_preceding_cell() {
        let doc = header_page("<tr><td>ACME Corp</td><th>Организатор</th></tr>");
        let mut announce = blank();
        apply_header_fields(&doc, &mut announce);
        assert_eq!(announce.general_info.organization, "ACME Corp");
    }

    #[test]
    fn test_last_cell_of_row_wins_over_preceding() {
        let doc = header_page("<tr><td>Before</td><th>Организатор</th><td>After</td></tr>");
        let mut announce = blank();
        apply_header_fields(&doc, &mut announce);
        assert_eq!(announce.general_info.organization, "After");
    }

    #[test]
    fn test_header_without_sibling_is_empty() {
        let doc = header_page("<tr><th>Организатор</th></tr>");
        let mut announce = blank();
        announce.general_info.organization = "stale".to_string();
        apply_header_fields(&doc, &mut announce);
        assert_eq!(announce.general_info.organization, "");
    }

    #[test]
    fn test_header_whitespace_is_trimmed() {
        let doc = header_page("<tr><th>\n  Организатор  </th><td>\n ACME Corp\n</td></tr>");
        let mut announce = blank();
        apply_header_fields(&doc, &mut announce);
        assert_eq!(announce.general_info.organization, "ACME Corp");
    }

    #[test]
    fn test_lot_row_included_verbatim() {
        let doc = header_page(&lot_row(["1", "A-1", "x", "Dell Laptop", "15-inch", "120000", "5"]));
        let lots = extract_lots(&doc);
        assert_eq!(
            lots,
            vec![Lot {
                name: "Dell Laptop".to_string(),
                description: "15-inch".to_string(),
                price_per_unit: "120000".to_string(),
                amount: "5".to_string(),
            }]
        );
    }

    #[test]
    fn test_lot_rows_filtered() {
        let rows = [
            lot_row(["№", "Номер", "x", LOT_HEADER_LABEL, "Описание", "Цена", "Кол-во"]),
            lot_row(["1", "A-1", "x", "", "empty name", "1", "1"]),
            lot_row(["2", "A-2", "x", "HP Laptop", "14-inch", "90000", "2"]),
        ]
        .concat();
        let lots = extract_lots(&header_page(&rows));
        assert_eq!(lots.len(), 1);
        assert_eq!(lots[0].name, "HP Laptop");
    }

    #[test]
    fn test_short_row_is_dropped() {
        let doc = header_page("<tr><td>1</td><td>2</td><td>3</td></tr>");
        assert!(extract_lots(&doc).is_empty());
    }

    #[test]
    fn test_extra_columns_ignored() {
        let doc = header_page(
            "<tr><td>1</td><td>2</td><td>3</td><td>Mouse</td><td>USB</td>\
             <td>3000</td><td>10</td><td>ignored</td></tr>",
        );
        let lots = extract_lots(&doc);
        assert_eq!(lots.len(), 1);
        assert_eq!(lots[0].amount, "10");
    }

    #[test]
    fn test_announce_links_keep_order_and_duplicates() {
        let doc = Html::parse_document(
            r#"<html><body>
                <a href="/ru/announce/index/2">two</a>
                <a href="/ru/search/lots?page=2">next</a>
                <a href="/ru/announce/index/1">one</a>
                <a href="/ru/announce/index/2">two again</a>
                <a>no href</a>
            </body></html>"#,
        );
        let pattern = Regex::new("announce/index").unwrap();
        assert_eq!(
            extract_announce_links(&doc, &pattern),
            vec![
                "/ru/announce/index/2",
                "/ru/announce/index/1",
                "/ru/announce/index/2",
            ]
        );
    }

    #[test]
    fn test_announce_links_ignore_non_anchor_elements() {
        let doc = Html::parse_document(
            r#"<html>
                <head><link rel="prefetch" href="/ru/announce/index/5"></head>
                <body>
                    <map><area href="/ru/announce/index/6"></map>
                    <a href="/ru/announce/index/1">one</a>
                </body>
            </html>"#,
        );
        let pattern = Regex::new("announce/index").unwrap();
        assert_eq!(
            extract_announce_links(&doc, &pattern),
            vec!["/ru/announce/index/1"]
        );
    }
}
