use reqwest::{Client, ClientBuilder, Response};

// The site occasionally serves different markup to obvious bots.
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36";

pub struct RequestClient {
    client: Client,
}

impl RequestClient {
    pub fn new() -> anyhow::Result<Self> {
        let client = ClientBuilder::new().user_agent(USER_AGENT).build()?;
        Ok(Self { client })
    }

    pub async fn fetch_url_response(&self, url: &str) -> anyhow::Result<Response> {
        let response = self.client.get(url).send().await?;
        Ok(response)
    }

    pub async fn fetch_url_body(&self, url: &str) -> anyhow::Result<String> {
        let response = self.fetch_url_response(url).await?;
        let body = response.error_for_status()?.text().await?;
        Ok(body)
    }
}
