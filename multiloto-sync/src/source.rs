use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;

/// Source distante de lignes de tirage, une par clé de groupe. `fetch_latest`
/// lit le petit fichier parallèle ne contenant que la dernière ligne, utilisé
/// par la sonde de fraîcheur pour éviter de retélécharger un gros fichier
/// inchangé.
#[async_trait]
pub trait RowSource: Send + Sync {
    async fn fetch_full(&self, group: &str) -> Result<String>;
    async fn fetch_latest(&self, group: &str) -> Result<String>;
}

pub struct HttpSource {
    client: Client,
    base_url: String,
}

impl HttpSource {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Transformation de chemin fixe : `{base}/{groupe}.csv`.
    pub fn full_url(&self, group: &str) -> String {
        format!("{}/{}.csv", self.base_url, group)
    }

    /// Fichier « dernière ligne » associé : `{base}/{groupe}-latest.csv`.
    pub fn latest_url(&self, group: &str) -> String {
        format!("{}/{}-latest.csv", self.base_url, group)
    }

    async fn fetch(&self, url: &str) -> Result<String> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Requête impossible : {}", url))?;
        let status = resp.status();
        if !status.is_success() {
            bail!("Réponse {} pour {}", status, url);
        }
        resp.text()
            .await
            .with_context(|| format!("Corps illisible : {}", url))
    }
}

#[async_trait]
impl RowSource for HttpSource {
    async fn fetch_full(&self, group: &str) -> Result<String> {
        self.fetch(&self.full_url(group)).await
    }

    async fn fetch_latest(&self, group: &str) -> Result<String> {
        self.fetch(&self.latest_url(group)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_transformation() {
        let source = HttpSource::new("https://miroir.example/csv/");
        assert_eq!(
            source.full_url("powerball"),
            "https://miroir.example/csv/powerball.csv"
        );
        assert_eq!(
            source.latest_url("powerball"),
            "https://miroir.example/csv/powerball-latest.csv"
        );
    }
}
