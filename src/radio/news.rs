use anyhow::{Context, Result};
use parking_lot::Mutex;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const NEWS_API_URL: &str = "https://newsapi.org/v2/top-headlines";
const CACHE_EXPIRY: Duration = Duration::from_secs(30 * 60);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewsItem {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NewsApiResponse {
    status: String,
    #[serde(default)]
    articles: Vec<NewsItem>,
    message: Option<String>,
}

/// Titulares de NewsAPI con cache de 30 minutos por categoría. Sin API key o
/// ante cualquier error se usan titulares locales.
pub struct NewsClient {
    http: reqwest::Client,
    api_key: Option<String>,
    country: String,
    cache: Mutex<HashMap<String, (Instant, Vec<NewsItem>)>>,
}

impl NewsClient {
    pub fn new(http: reqwest::Client, api_key: Option<String>) -> Self {
        Self {
            http,
            api_key,
            country: "us".to_string(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub async fn headlines(&self, category: &str) -> Vec<NewsItem> {
        if let Some(items) = self.cached(category) {
            debug!("📰 Noticias en cache para {}", category);
            return items;
        }

        let items = match &self.api_key {
            Some(key) => match self.fetch(key, category).await {
                Ok(items) if !items.is_empty() => items,
                Ok(_) => {
                    warn!("⚠️ NewsAPI no devolvió artículos para {}", category);
                    fallback_headlines(category)
                }
                Err(e) => {
                    warn!("⚠️ Error consultando NewsAPI: {:#}", e);
                    fallback_headlines(category)
                }
            },
            None => fallback_headlines(category),
        };

        self.cache
            .lock()
            .insert(category.to_string(), (Instant::now(), items.clone()));
        items
    }

    fn cached(&self, category: &str) -> Option<Vec<NewsItem>> {
        let mut cache = self.cache.lock();
        cache.retain(|_, (at, _)| at.elapsed() < CACHE_EXPIRY);
        cache.get(category).map(|(_, items)| items.clone())
    }

    async fn fetch(&self, key: &str, category: &str) -> Result<Vec<NewsItem>> {
        let response = self
            .http
            .get(NEWS_API_URL)
            .query(&[
                ("apiKey", key),
                ("category", category),
                ("country", self.country.as_str()),
                ("pageSize", "5"),
            ])
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .context("Error de red con NewsAPI")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("NewsAPI HTTP {}", status);
        }

        let body: NewsApiResponse = response.json().await.context("Respuesta de NewsAPI inválida")?;
        if body.status != "ok" {
            anyhow::bail!(
                "NewsAPI: {}",
                body.message.unwrap_or_else(|| "error desconocido".into())
            );
        }

        info!("📰 {} titulares de {} obtenidos", body.articles.len(), category);
        Ok(body.articles)
    }
}

pub fn fallback_headlines(category: &str) -> Vec<NewsItem> {
    let item = |title: &str, description: &str| NewsItem {
        title: title.to_string(),
        description: Some(description.to_string()),
    };

    match category {
        "technology" => vec![
            item(
                "Nuevo avance en IA ayuda a resolver problemas complejos",
                "Investigadores desarrollaron un modelo que resuelve problemas complejos en tiempo récord.",
            ),
            item(
                "Empresas tecnológicas anuncian nuevas funciones de privacidad",
                "Las grandes tecnológicas despliegan nuevas funciones para proteger los datos de los usuarios.",
            ),
        ],
        "weather" => vec![
            item(
                "Pronóstico para la semana",
                "Se esperan temperaturas templadas y cielos parcialmente nublados.",
            ),
            item(
                "Climatólogos informan sobre tendencias de la temporada",
                "La temporada muestra patrones típicos con algunas variaciones regionales.",
            ),
        ],
        _ => vec![
            item(
                "La cooperación global logra un importante acuerdo ambiental",
                "Países de todo el mundo acordaron reducir emisiones de carbono un 30% en la próxima década.",
            ),
            item(
                "Lanzan una iniciativa educativa mundial",
                "Un nuevo programa busca mejorar el acceso a la educación en comunidades desatendidas.",
            ),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_without_key_uses_fallback() {
        let client = NewsClient::new(reqwest::Client::new(), None);

        let tech = client.headlines("technology").await;
        assert_eq!(tech, fallback_headlines("technology"));

        let unknown = client.headlines("sports").await;
        assert_eq!(unknown, fallback_headlines("general"));
    }

    #[tokio::test]
    async fn test_results_are_cached() {
        let client = NewsClient::new(reqwest::Client::new(), None);
        client.headlines("weather").await;
        assert!(client.cached("weather").is_some());
        assert!(client.cached("technology").is_none());
    }

    #[test]
    fn test_newsapi_payload() {
        let body: NewsApiResponse = serde_json::from_str(
            r#"{"status":"ok","totalResults":1,"articles":[{"title":"T","description":null,"url":"u"}]}"#,
        )
        .unwrap();
        assert_eq!(body.articles.len(), 1);
        assert!(body.articles[0].description.is_none());
    }
}
