use crate::error::CmsError;
use crate::model::pages::{
    Page, PageChangeset, PageInput, PageSearchHit, PageWithCategories, HOMEPAGE_SLUG,
};
use crate::store::PageStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct PageService {
    store: Arc<dyn PageStore>,
}

impl PageService {
    pub fn new(store: Arc<dyn PageStore>) -> Self {
        PageService { store }
    }

    pub fn create(&self, input: PageInput, author_id: i32) -> Result<PageWithCategories, CmsError> {
        let categories = input.categories.clone();
        let changes = validate(input)?;

        if self.store.find_page(&changes.slug)?.is_some() {
            return Err(CmsError::InvalidPage(
                "The slug has already been taken.".to_owned(),
            ));
        }

        let page = self.store.insert_page(changes.into_new_page(author_id))?;
        if let Some(categories) = categories {
            self.store.save_page_categories(page.id, &clean(categories))?;
        }

        log::info!("page {} created by user {}", page.slug, author_id);
        self.with_categories(page)
    }

    pub fn show(&self, slug: &str) -> Result<PageWithCategories, CmsError> {
        let page = self.find(slug)?;
        self.with_categories(page)
    }

    /// Replaces the page content and its categories. Submitting no category
    /// list leaves the page without categories.
    pub fn update(&self, slug: &str, mut input: PageInput) -> Result<PageWithCategories, CmsError> {
        input.css.get_or_insert_with(String::new);
        input.js.get_or_insert_with(String::new);
        let categories = input.categories.clone();
        let changes = validate(input)?;

        let page = self.find(slug)?;

        if page.is_homepage() {
            if changes.slug != HOMEPAGE_SLUG {
                return Err(CmsError::HomepageSlug);
            }
            if !changes.show_nav {
                return Err(CmsError::HomepageNav);
            }
        }

        if changes.slug != page.slug && self.store.find_page(&changes.slug)?.is_some() {
            return Err(CmsError::InvalidPage(
                "The slug has already been taken.".to_owned(),
            ));
        }

        let updated = self.store.update_page(page.id, changes)?;

        self.store.delete_page_categories(page.id)?;
        if let Some(categories) = categories {
            self.store.save_page_categories(page.id, &clean(categories))?;
        }
        log::info!("page {} updated", updated.slug);
        self.with_categories(updated)
    }

    pub fn destroy(&self, slug: &str) -> Result<(), CmsError> {
        let page = self.find(slug)?;
        if page.is_homepage() {
            return Err(CmsError::HomepageDelete);
        }

        self.store.delete_page_categories(page.id)?;
        self.store.delete_page(page.id)?;
        log::info!("page {} deleted", slug);
        Ok(())
    }

    pub fn search(&self, query: &str) -> Result<Vec<PageSearchHit>, CmsError> {
        self.store.search_pages(query)
    }

    fn find(&self, slug: &str) -> Result<Page, CmsError> {
        match self.store.find_page(slug)? {
            Some(page) => Ok(page),
            None if slug == HOMEPAGE_SLUG => Err(CmsError::HomepageMissing),
            None => Err(CmsError::PageNotFound),
        }
    }

    fn with_categories(&self, page: Page) -> Result<PageWithCategories, CmsError> {
        let categories = self.store.page_categories(page.id)?;
        Ok(PageWithCategories { page, categories })
    }
}

fn required(value: Option<String>, field: &str) -> Result<String, CmsError> {
    match value.map(|v| v.trim().to_owned()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(CmsError::InvalidPage(format!(
            "The {} field is required.",
            field
        ))),
    }
}

fn validate(input: PageInput) -> Result<PageChangeset, CmsError> {
    let title = required(input.title, "title")?;
    let nav_title = required(input.nav_title, "nav title")?;
    let slug = required(input.slug, "slug")?;
    let body = required(input.body, "body")?;

    if !slug
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(CmsError::InvalidPage(
            "The slug may only contain letters, numbers, and dashes.".to_owned(),
        ));
    }

    Ok(PageChangeset {
        title,
        nav_title,
        slug,
        body,
        css: input.css.unwrap_or_default(),
        js: input.js.unwrap_or_default(),
        show_title: input.show_title,
        show_nav: input.show_nav,
        icon: input.icon.filter(|icon| !icon.trim().is_empty()),
    })
}

fn clean(categories: Vec<String>) -> Vec<String> {
    categories
        .into_iter()
        .map(|c| c.trim().to_owned())
        .filter(|c| !c.is_empty())
        .collect()
}
