use blog_models::{BlogChanges, NewBlog};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Absent fields deserialize empty and are reported by `missing_fields`
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateBlogCommand {
    #[serde(skip)]
    pub author: Uuid,
    pub title: String,
    pub description: String,
    pub image: Option<String>,
    pub blog_content: String,
    pub category: String,
}

impl CreateBlogCommand {
    /// Names of required fields left blank
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("title", &self.title),
            ("description", &self.description),
            ("blogContent", &self.blog_content),
            ("category", &self.category),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

impl From<CreateBlogCommand> for NewBlog {
    fn from(command: CreateBlogCommand) -> Self {
        Self {
            title: command.title,
            description: command.description,
            image: command.image,
            blog_content: command.blog_content,
            category: command.category,
            author: command.author,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBlogCommand {
    #[serde(skip)]
    pub blog_id: Uuid,
    #[serde(skip)]
    pub caller: Uuid,
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub blog_content: Option<String>,
    pub category: Option<String>,
}

impl UpdateBlogCommand {
    pub fn changes(&self) -> BlogChanges {
        BlogChanges {
            title: self.title.clone(),
            description: self.description.clone(),
            image: self.image.clone(),
            blog_content: self.blog_content.clone(),
            category: self.category.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeleteBlogCommand {
    pub blog_id: Uuid,
    pub caller: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields() {
        let command = CreateBlogCommand {
            author: Uuid::now_v7(),
            title: "Title".into(),
            description: " ".into(),
            image: None,
            blog_content: String::new(),
            category: "Tech".into(),
        };

        assert_eq!(command.missing_fields(), vec!["description", "blogContent"]);
    }

    #[test]
    fn test_absent_fields_are_reported_missing() {
        let command: CreateBlogCommand = serde_json::from_str(
            r#"{"description": "Ownership", "blogContent": "Borrowing"}"#,
        )
        .unwrap();

        assert_eq!(command.missing_fields(), vec!["title", "category"]);
        assert_eq!(command.image, None);
    }
}
