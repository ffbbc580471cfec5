use crate::schema::pages;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

pub const HOMEPAGE_SLUG: &str = "home";

#[derive(Serialize, Deserialize, Queryable, Identifiable, Debug, Clone, PartialEq)]
#[diesel(table_name = pages)]
pub struct Page {
    pub id: i32,
    pub title: String,
    pub nav_title: String,
    pub slug: String,
    pub body: String,
    pub css: String,
    pub js: String,
    pub show_title: bool,
    pub show_nav: bool,
    pub icon: Option<String>,
    pub user_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Page {
    pub fn is_homepage(&self) -> bool {
        self.slug == HOMEPAGE_SLUG
    }
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = pages)]
pub struct NewPage {
    pub title: String,
    pub nav_title: String,
    pub slug: String,
    pub body: String,
    pub css: String,
    pub js: String,
    pub show_title: bool,
    pub show_nav: bool,
    pub icon: Option<String>,
    pub user_id: i32,
}

#[derive(AsChangeset, Debug, Clone, PartialEq)]
#[diesel(table_name = pages)]
#[diesel(treat_none_as_null = true)]
pub struct PageChangeset {
    pub title: String,
    pub nav_title: String,
    pub slug: String,
    pub body: String,
    pub css: String,
    pub js: String,
    pub show_title: bool,
    pub show_nav: bool,
    pub icon: Option<String>,
}

impl PageChangeset {
    pub fn into_new_page(self, user_id: i32) -> NewPage {
        NewPage {
            title: self.title,
            nav_title: self.nav_title,
            slug: self.slug,
            body: self.body,
            css: self.css,
            js: self.js,
            show_title: self.show_title,
            show_nav: self.show_nav,
            icon: self.icon,
            user_id,
        }
    }
}

/// Page form as submitted by an editor.
#[derive(Deserialize, Debug, Default, Clone)]
pub struct PageInput {
    pub title: Option<String>,
    pub nav_title: Option<String>,
    pub slug: Option<String>,
    pub body: Option<String>,
    pub css: Option<String>,
    pub js: Option<String>,
    #[serde(default, deserialize_with = "checkbox")]
    pub show_title: bool,
    #[serde(default, deserialize_with = "checkbox")]
    pub show_nav: bool,
    pub icon: Option<String>,
    #[serde(default, deserialize_with = "category_list")]
    pub categories: Option<Vec<String>>,
}

/// Accepts a JSON array or the comma separated list an html form sends.
fn category_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Categories {
        Many(Vec<String>),
        Joined(String),
    }

    Ok(Option::<Categories>::deserialize(deserializer)?.map(|categories| match categories {
        Categories::Many(list) => list,
        Categories::Joined(joined) => joined.split(',').map(str::to_owned).collect(),
    }))
}

/// Accepts either a JSON boolean or the `"on"` value an html checkbox sends.
fn checkbox<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Checkbox {
        Flag(bool),
        Text(String),
    }

    Ok(match Option::<Checkbox>::deserialize(deserializer)? {
        Some(Checkbox::Flag(flag)) => flag,
        Some(Checkbox::Text(text)) => text == "on" || text == "true" || text == "1",
        None => false,
    })
}

/// A page together with its categories, the shape returned to clients.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct PageWithCategories {
    #[serde(flatten)]
    pub page: Page,
    pub categories: Vec<String>,
}

#[derive(Serialize, Queryable, Debug, Clone, PartialEq)]
pub struct PageSearchHit {
    pub id: i32,
    pub text: String,
}
