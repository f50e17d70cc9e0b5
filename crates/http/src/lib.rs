use std::future::Future;

pub type Error = Box<dyn std::error::Error + Send + Sync>;

/// Raw HTTP exchange result. Non-2xx statuses are returned, not raised, so
/// callers can report upstream status and body instead of losing them.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub body: Vec<u8>,
}

impl Response {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

pub trait HttpClient: Send + Sync {
    fn get(&self, path: &str) -> impl Future<Output = Result<Response, Error>> + Send;

    fn post(
        &self,
        path: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> impl Future<Output = Result<Response, Error>> + Send;
}

/// `HttpClient` over reqwest with a fixed base URL and default headers.
#[derive(Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
    base_url: url::Url,
    headers: Vec<(String, String)>,
}

impl ReqwestClient {
    pub fn new(base_url: &str) -> Result<Self, Error> {
        Ok(Self {
            client: reqwest::Client::new(),
            base_url: url::Url::parse(base_url)?,
            headers: Vec::new(),
        })
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    fn request(
        &self,
        method: reqwest::Method,
        path: &str,
    ) -> Result<reqwest::RequestBuilder, Error> {
        let url = self.base_url.join(path)?;
        let mut req = self.client.request(method, url);
        for (name, value) in &self.headers {
            req = req.header(name.as_str(), value.as_str());
        }
        Ok(req)
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> Result<Response, Error> {
        let response = req.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();
        Ok(Response { status, body })
    }
}

impl HttpClient for ReqwestClient {
    async fn get(&self, path: &str) -> Result<Response, Error> {
        let req = self.request(reqwest::Method::GET, path)?;
        self.send(req).await
    }

    async fn post(&self, path: &str, body: Vec<u8>, content_type: &str) -> Result<Response, Error> {
        let req = self
            .request(reqwest::Method::POST, path)?
            .header("content-type", content_type)
            .body(body);
        self.send(req).await
    }
}
