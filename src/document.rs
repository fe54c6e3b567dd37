// src/document.rs

//! Minimal traversal interface over parsed markup.
//!
//! Extraction only needs a handful of capabilities: find elements by tag,
//! find elements by an attribute predicate, walk direct children and
//! siblings, and read text. Keeping them behind a trait lets the
//! extractors stay independent of the HTML parser in use.

use scraper::{ElementRef, Html};

/// A parsed document.
pub trait DocumentTree {
    type Node<'a>: TreeNode
    where
        Self: 'a;

    /// All elements with the given tag name, in document order.
    fn find_by_tag(&self, tag: &str) -> Vec<Self::Node<'_>>;

    /// Elements with the given tag carrying `attr` whose value satisfies `predicate`,
    /// in document order.
    fn find_by_attr<P>(&self, tag: &str, attr: &str, predicate: P) -> Vec<Self::Node<'_>>
    where
        P: Fn(&str) -> bool;
}

/// An element inside a [`DocumentTree`].
pub trait TreeNode: Sized {
    /// Direct child elements (text nodes skipped).
    fn child_elements(&self) -> Vec<Self>;

    /// Sibling elements on both sides of this one, in document order, excluding itself.
    fn sibling_elements(&self) -> Vec<Self>;

    /// Concatenated text of all descendants.
    fn text_content(&self) -> String;

    fn attribute(&self, name: &str) -> Option<String>;
}

impl DocumentTree for Html {
    type Node<'a>
        = ElementRef<'a>
    where
        Self: 'a;

    fn find_by_tag(&self, tag: &str) -> Vec<ElementRef<'_>> {
        self.root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|el| el.value().name() == tag)
            .collect()
    }

    fn find_by_attr<P>(&self, tag: &str, attr: &str, predicate: P) -> Vec<ElementRef<'_>>
    where
        P: Fn(&str) -> bool,
    {
        self.find_by_tag(tag)
            .into_iter()
            .filter(|el| el.value().attr(attr).is_some_and(&predicate))
            .collect()
    }
}

impl TreeNode for ElementRef<'_> {
    fn child_elements(&self) -> Vec<Self> {
        self.children().filter_map(ElementRef::wrap).collect()
    }

    fn sibling_elements(&self) -> Vec<Self> {
        let mut siblings: Vec<Self> = self.prev_siblings().filter_map(ElementRef::wrap).collect();
        siblings.reverse();
        siblings.extend(self.next_siblings().filter_map(ElementRef::wrap));
        siblings
    }

    fn text_content(&self) -> String {
        self.text().collect()
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.value().attr(name).map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"
        <html><body>
            <div id="a"><span>one</span> <span>two <b>bold</b></span></div>
            <a href="/x">x</a>
            <a name="anchor">no href</a>
            <p><i>first</i>text<i>second</i><i>third</i></p>
        </body></html>
    "#;

    #[test]
    fn test_find_by_tag_in_document_order() {
        let doc = Html::parse_document(FIXTURE);
        let spans = doc.find_by_tag("span");
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].text_content(), "one");
        assert_eq!(spans[1].text_content(), "two bold");
    }

    #[test]
    fn test_find_by_attr() {
        let doc = Html::parse_document(FIXTURE);
        let links = doc.find_by_attr("a", "href", |_| true);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].attribute("href").as_deref(), Some("/x"));

        assert!(doc.find_by_attr("a", "href", |v| v.contains("y")).is_empty());
        assert!(doc.find_by_attr("div", "href", |_| true).is_empty());
    }

    #[test]
    fn test_children_and_siblings_skip_text() {
        let doc = Html::parse_document(FIXTURE);
        let divs = doc.find_by_tag("div");
        assert_eq!(TreeNode::child_elements(&divs[0]).len(), 2);

        let italics = doc.find_by_tag("i");
        let siblings = |index: usize| -> Vec<String> {
            italics[index]
                .sibling_elements()
                .iter()
                .map(|el| el.text_content())
                .collect()
        };
        assert_eq!(siblings(0), vec!["second", "third"]);
        assert_eq!(siblings(1), vec!["first", "third"]);
        assert_eq!(siblings(2), vec!["first", "second"]);
    }
}
