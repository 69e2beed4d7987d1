use reqwest::{StatusCode, Url};

/// Status and body of a completed request.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub body: String,
}

/// Issues blocking GET requests. Transport failures surface as `Err`,
/// HTTP-level failures as a non-success [`HttpResponse::status`].
pub trait HttpClient {
    fn get(&self, url: &Url) -> reqwest::Result<HttpResponse>;
}

impl<C: HttpClient + ?Sized> HttpClient for &C {
    fn get(&self, url: &Url) -> reqwest::Result<HttpResponse> {
        (**self).get(url)
    }
}
