//! Client for the public Star Wars character API.

use reqwest::Client;
use tracing::debug;

use crate::api::check;
use crate::error::ApiResult;
use crate::model::{Page, Person};

/// Unauthenticated client for the character listing. Kept separate from
/// [`crate::api::ApiClient`] so no session token ever leaks to the third
/// party.
#[derive(Debug, Clone)]
pub struct PeopleClient {
    http: Client,
    base_url: String,
}

impl PeopleClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { http: Client::new(), base_url: base_url.into() }
    }

    /// One page of characters; pages are 1-based on this API.
    pub async fn list_people(&self, page: u32) -> ApiResult<Page<Person>> {
        let url = format!("{}/people/", self.base_url.trim_end_matches('/'));
        let res = self.http.get(url).query(&[("page", page.to_string())]).send().await?;
        let res = check(res).await?;
        let page: Page<Person> = serde_json::from_str(&res.text().await?)?;

        debug!(count = page.count, returned = page.results.len(), "fetched characters");
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn people_page_decodes_api_shape() {
        let body = r#"{
            "count": 82,
            "next": "https://swapi.dev/api/people/?page=2",
            "previous": null,
            "results": [{
                "name": "Luke Skywalker",
                "height": "172",
                "mass": "77",
                "gender": "male",
                "birth_year": "19BBY",
                "hair_color": "blond",
                "skin_color": "fair",
                "eye_color": "blue",
                "url": "https://swapi.dev/api/people/1/"
            }]
        }"#;

        let page: Page<Person> = serde_json::from_str(body).expect("must decode");
        assert_eq!(page.count, 82);
        assert_eq!(page.results[0].name, "Luke Skywalker");
        assert!(page.next.is_some());
    }
}
