use uuid::Uuid;

use crate::{Error, Time, UserId, STUB_UUID};

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize)]
pub struct PostId(pub Uuid);

impl PostId {
    pub fn stub() -> PostId {
        PostId(STUB_UUID)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Post {
    pub id: PostId,
    pub author_id: UserId,

    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub featured_image: Option<String>,

    pub published: bool,
    pub published_at: Option<Time>,

    pub created_at: Time,
    pub updated_at: Time,
}

#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub struct NewPost {
    pub id: PostId,
    pub author_id: UserId,
    pub title: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub featured_image: Option<String>,
    pub published: bool,
    pub categories: Vec<crate::CategoryId>,
}

impl NewPost {
    pub fn validate(&self) -> Result<(), Error> {
        crate::validate_text(&self.title)?;
        crate::validate_text(&self.content)?;
        if let Some(e) = &self.excerpt {
            crate::validate_string(e)?;
        }
        if let Some(i) = &self.featured_image {
            crate::validate_string(i)?;
        }
        Ok(())
    }

    pub fn into_post(self, now: Time) -> Post {
        Post {
            slug: slugify(&self.title),
            id: self.id,
            author_id: self.author_id,
            title: self.title,
            content: self.content,
            excerpt: self.excerpt,
            featured_image: self.featured_image,
            published: self.published,
            published_at: self.published.then_some(now),
            created_at: now,
            updated_at: now,
        }
    }
}

/// URL slug for a post title: lowercased, with every run of
/// non-alphanumeric characters collapsed into a single dash.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}
