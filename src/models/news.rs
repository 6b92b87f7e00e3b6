use serde::{Deserialize, Serialize};

/// One headline from a news provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub title: String,
    pub url: Option<String>,
    pub source: Option<String>,
    /// Raw provider timestamp (ISO-8601)
    pub published_at: Option<String>,
    pub description: Option<String>,
}

impl NewsArticle {
    /// `2026-10-19T08:00:00Z` -> `2026-10-19 08:00`
    pub fn published_label(&self) -> String {
        self.published_at
            .as_deref()
            .map(|raw| raw.chars().take(16).collect::<String>().replace('T', " "))
            .unwrap_or_default()
    }
}

/// Headlines grouped by provider for one digest
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewsDigest {
    pub cryptopanic: Vec<NewsArticle>,
    pub coinmarketcap: Vec<NewsArticle>,
}

impl NewsDigest {
    pub fn is_empty(&self) -> bool {
        self.cryptopanic.is_empty() && self.coinmarketcap.is_empty()
    }

    pub fn article_count(&self) -> usize {
        self.cryptopanic.len() + self.coinmarketcap.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_published_label_trims_seconds() {
        let article = NewsArticle {
            title: "t".to_string(),
            url: None,
            source: None,
            published_at: Some("2026-10-19T08:00:42Z".to_string()),
            description: None,
        };
        assert_eq!(article.published_label(), "2026-10-19 08:00");
    }

    #[test]
    fn test_published_label_missing() {
        let article = NewsArticle {
            title: "t".to_string(),
            url: None,
            source: None,
            published_at: None,
            description: None,
        };
        assert_eq!(article.published_label(), "");
    }
}
