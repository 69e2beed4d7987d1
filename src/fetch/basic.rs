use std::time::Duration;

use reqwest::Url;
use reqwest::blocking::Client;

use super::client::{HttpClient, HttpResponse};

pub struct BasicClient(Client);

impl BasicClient {
    pub fn new() -> reqwest::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self(client))
    }
}

impl HttpClient for BasicClient {
    fn get(&self, url: &Url) -> reqwest::Result<HttpResponse> {
        let resp = self.0.get(url.clone()).send()?;
        let status = resp.status();
        let body = resp.text()?;
        Ok(HttpResponse { status, body })
    }
}
