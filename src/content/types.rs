use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;

pub const DEFAULT_ORDER: i64 = 999;

/// YAML frontmatter of a page. Unknown keys land in `extra` and are passed
/// through to templates.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PageMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    /// Comma separated audience tags, see [`super::flatten_for_sidebar`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl PageMeta {
    pub fn is_hidden(&self) -> bool {
        self.hidden == Some(true)
    }

    pub fn visibility_tags(&self) -> Vec<String> {
        match &self.visibility {
            Some(raw) => raw.split(',').map(|v| v.trim().to_string()).collect(),
            None => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContentFile {
    pub path: String,
    pub title: String,
    pub order: i64,
    pub visibility: Vec<String>,
    pub hidden: bool,
    pub meta: PageMeta,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContentDir {
    pub path: String,
    pub title: String,
    pub order: i64,
    pub children: Vec<ContentNode>,
    /// Set when the folder's `index.md` has a body of its own.
    pub index_path: Option<String>,
    pub hidden: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ContentNode {
    File(ContentFile),
    Dir(ContentDir),
}

impl ContentNode {
    pub fn path(&self) -> &str {
        match self {
            ContentNode::File(f) => &f.path,
            ContentNode::Dir(d) => &d.path,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            ContentNode::File(f) => &f.title,
            ContentNode::Dir(d) => &d.title,
        }
    }

    pub fn order(&self) -> i64 {
        match self {
            ContentNode::File(f) => f.order,
            ContentNode::Dir(d) => d.order,
        }
    }

    pub fn hidden(&self) -> bool {
        match self {
            ContentNode::File(f) => f.hidden,
            ContentNode::Dir(d) => d.hidden,
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, ContentNode::Dir(_))
    }
}

// Templates walk the tree and switch on `isDir`.
impl Serialize for ContentNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ContentNode::File(file) => {
                let mut s = serializer.serialize_struct("ContentFile", 7)?;
                s.serialize_field("path", &file.path)?;
                s.serialize_field("isDir", &false)?;
                s.serialize_field("title", &file.title)?;
                s.serialize_field("order", &file.order)?;
                s.serialize_field("visibility", &file.visibility)?;
                s.serialize_field("hidden", &file.hidden)?;
                s.serialize_field("meta", &file.meta)?;
                s.end()
            }
            ContentNode::Dir(dir) => {
                let mut s = serializer.serialize_struct("ContentDir", 7)?;
                s.serialize_field("path", &dir.path)?;
                s.serialize_field("isDir", &true)?;
                s.serialize_field("title", &dir.title)?;
                s.serialize_field("order", &dir.order)?;
                s.serialize_field("children", &dir.children)?;
                s.serialize_field("indexPath", &dir.index_path)?;
                s.serialize_field("hidden", &dir.hidden)?;
                s.end()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocItem {
    pub id: String,
    pub text: String,
    pub level: u8,
}

/// A compiled page, ready to be placed in the layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CachedPage {
    pub html: String,
    pub toc: Vec<TocItem>,
    pub meta: PageMeta,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SidebarEntry {
    pub path: String,
    pub title: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility_is_split_and_trimmed() {
        let meta = PageMeta {
            visibility: Some("internal, partners ,beta".to_string()),
            ..Default::default()
        };
        assert_eq!(meta.visibility_tags(), vec!["internal", "partners", "beta"]);
        assert!(PageMeta::default().visibility_tags().is_empty());
    }

    #[test]
    fn test_serializes_nodes_with_is_dir_flag() {
        let node = ContentNode::Dir(ContentDir {
            path: "/guides".to_string(),
            title: "Guides".to_string(),
            order: 1,
            children: vec![ContentNode::File(ContentFile {
                path: "/guides/start".to_string(),
                title: "Start".to_string(),
                order: 999,
                visibility: vec![],
                hidden: false,
                meta: PageMeta::default(),
            })],
            index_path: None,
            hidden: false,
        });

        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["isDir"], true);
        assert_eq!(json["indexPath"], serde_json::Value::Null);
        assert_eq!(json["children"][0]["isDir"], false);
        assert_eq!(json["children"][0]["path"], "/guides/start");
    }
}
