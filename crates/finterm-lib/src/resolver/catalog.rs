//! Static candidate pools for local resolution
//!
//! Countries, the dataset catalog, and the category catalog are scored
//! in-process without any network access.

use super::fuzzy::{LOCAL_MATCH_THRESHOLD, score};
use super::{MatchKind, ResolvedMatch};

/// Maximum matches returned by a local pass
pub const LOCAL_RESULT_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Country {
    pub iso2: String,
    pub iso3: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    pub id: String,
    pub label: String,
    pub short_label: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: String,
    pub label: String,
    pub description: String,
}

const COUNTRIES: &[(&str, &str, &str)] = &[
    ("AR", "ARG", "Argentina"),
    ("AU", "AUS", "Australia"),
    ("AT", "AUT", "Austria"),
    ("BE", "BEL", "Belgium"),
    ("BR", "BRA", "Brazil"),
    ("CA", "CAN", "Canada"),
    ("CL", "CHL", "Chile"),
    ("CN", "CHN", "China"),
    ("CO", "COL", "Colombia"),
    ("CI", "CIV", "Côte d'Ivoire"),
    ("CZ", "CZE", "Czechia"),
    ("DK", "DNK", "Denmark"),
    ("EG", "EGY", "Egypt"),
    ("FI", "FIN", "Finland"),
    ("FR", "FRA", "France"),
    ("DE", "DEU", "Germany"),
    ("GR", "GRC", "Greece"),
    ("HK", "HKG", "Hong Kong"),
    ("HU", "HUN", "Hungary"),
    ("IN", "IND", "India"),
    ("ID", "IDN", "Indonesia"),
    ("IE", "IRL", "Ireland"),
    ("IL", "ISR", "Israel"),
    ("IT", "ITA", "Italy"),
    ("JP", "JPN", "Japan"),
    ("KE", "KEN", "Kenya"),
    ("KR", "KOR", "Korea, Republic of"),
    ("MY", "MYS", "Malaysia"),
    ("MX", "MEX", "Mexico"),
    ("NL", "NLD", "Netherlands"),
    ("NZ", "NZL", "New Zealand"),
    ("NG", "NGA", "Nigeria"),
    ("NO", "NOR", "Norway"),
    ("PK", "PAK", "Pakistan"),
    ("PE", "PER", "Peru"),
    ("PH", "PHL", "Philippines"),
    ("PL", "POL", "Poland"),
    ("PT", "PRT", "Portugal"),
    ("RO", "ROU", "Romania"),
    ("SA", "SAU", "Saudi Arabia"),
    ("SG", "SGP", "Singapore"),
    ("ZA", "ZAF", "South Africa"),
    ("ES", "ESP", "Spain"),
    ("SE", "SWE", "Sweden"),
    ("CH", "CHE", "Switzerland"),
    ("TW", "TWN", "Taiwan"),
    ("TH", "THA", "Thailand"),
    ("TR", "TUR", "Türkiye"),
    ("AE", "ARE", "United Arab Emirates"),
    ("GB", "GBR", "United Kingdom"),
    ("US", "USA", "United States of America"),
    ("VN", "VNM", "Viet Nam"),
];

const DATASETS: &[(&str, &str, &str, &str)] = &[
    ("gdp", "Gross Domestic Product", "GDP", "Quarterly and annual output by country"),
    ("cpi", "Consumer Price Index", "CPI", "Headline and core inflation"),
    ("unemployment", "Unemployment Rate", "Jobless", "Labour force unemployment by country"),
    ("policy-rates", "Central Bank Policy Rates", "Policy rates", "Benchmark rates set by central banks"),
    ("fx-rates", "Foreign Exchange Rates", "FX", "Spot rates against major currencies"),
    ("treasury-yields", "Treasury Yield Curve", "Yields", "Government bond yields by maturity"),
    ("sec-filings", "SEC Filings", "Filings", "EDGAR filings for listed companies"),
    ("insider-trades", "Insider Transactions", "Insiders", "Form 4 insider buys and sells"),
    ("crypto-prices", "Cryptocurrency Prices", "Crypto", "Spot prices for major digital assets"),
    ("commodities", "Commodity Prices", "Commodities", "Energy, metals, and agricultural futures"),
    ("trade-balance", "Balance of Trade", "Trade", "Exports, imports, and net trade"),
    ("government-debt", "Government Debt to GDP", "Debt", "General government gross debt"),
];

const CATEGORIES: &[(&str, &str, &str)] = &[
    ("macro", "Macroeconomics", "Growth, prices, and labour indicators"),
    ("markets", "Markets", "Equities, indices, and volatility"),
    ("rates", "Interest Rates", "Policy rates and sovereign yields"),
    ("currencies", "Currencies", "Foreign exchange and money markets"),
    ("regulatory", "Regulatory Filings", "Company disclosures and ownership"),
    ("digital-assets", "Digital Assets", "Cryptocurrencies and stablecoins"),
    ("commodities", "Commodities", "Energy, metals, and agriculture"),
    ("fiscal", "Fiscal Policy", "Government budgets and debt"),
];

/// Local candidate pools
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    countries: Vec<Country>,
    datasets: Vec<Dataset>,
    categories: Vec<Category>,
}

impl Catalog {
    pub fn new(countries: Vec<Country>, datasets: Vec<Dataset>, categories: Vec<Category>) -> Self {
        Self {
            countries,
            datasets,
            categories,
        }
    }

    /// Catalog shipped with the terminal
    pub fn builtin() -> Self {
        Self {
            countries: COUNTRIES
                .iter()
                .map(|&(iso2, iso3, name)| Country {
                    iso2: iso2.to_string(),
                    iso3: iso3.to_string(),
                    name: name.to_string(),
                })
                .collect(),
            datasets: DATASETS
                .iter()
                .map(|&(id, label, short_label, description)| Dataset {
                    id: id.to_string(),
                    label: label.to_string(),
                    short_label: short_label.to_string(),
                    description: description.to_string(),
                })
                .collect(),
            categories: CATEGORIES
                .iter()
                .map(|&(id, label, description)| Category {
                    id: id.to_string(),
                    label: label.to_string(),
                    description: description.to_string(),
                })
                .collect(),
        }
    }

    pub fn countries(&self) -> &[Country] {
        &self.countries
    }

    pub fn datasets(&self) -> &[Dataset] {
        &self.datasets
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Score every pool against `query`
    ///
    /// Keeps candidates at or above [`LOCAL_MATCH_THRESHOLD`], sorted by
    /// descending score with ties in pool order (countries, datasets,
    /// categories), capped at [`LOCAL_RESULT_LIMIT`].
    pub fn resolve_local(&self, query: &str) -> Vec<ResolvedMatch> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }

        let keep = |s: f64| s >= LOCAL_MATCH_THRESHOLD;

        let countries = self.countries.iter().filter_map(|country| {
            let s = country_score(query, country);
            keep(s).then(|| country_match(country, s))
        });
        let datasets = self.datasets.iter().filter_map(|dataset| {
            let s = score(query, &dataset.id)
                .max(score(query, &dataset.label))
                .max(score(query, &dataset.short_label));
            keep(s).then(|| dataset_match(dataset, s))
        });
        let categories = self.categories.iter().filter_map(|category| {
            let s = score(query, &category.id).max(score(query, &category.label));
            keep(s).then(|| category_match(category, s))
        });

        let mut matches: Vec<ResolvedMatch> = countries.chain(datasets).chain(categories).collect();

        matches.sort_by(|a, b| b.score.total_cmp(&a.score));
        matches.truncate(LOCAL_RESULT_LIMIT);
        matches
    }
}

fn country_score(query: &str, country: &Country) -> f64 {
    if query.eq_ignore_ascii_case(&country.iso2) || query.eq_ignore_ascii_case(&country.iso3) {
        100.0
    } else {
        score(query, &country.name)
    }
}

fn country_match(country: &Country, score: f64) -> ResolvedMatch {
    ResolvedMatch {
        iso3: Some(country.iso3.clone()),
        ..ResolvedMatch::new(
            MatchKind::Country,
            &country.name,
            format!("Country - {} / {}", country.iso2, country.iso3),
            format!("/explorer/country/{}", country.iso3.to_ascii_lowercase()),
            score,
        )
    }
}

fn dataset_match(dataset: &Dataset, score: f64) -> ResolvedMatch {
    ResolvedMatch::new(
        MatchKind::Dataset,
        &dataset.label,
        dataset.description.clone(),
        format!("/explorer/dataset/{}", dataset.id),
        score,
    )
}

fn category_match(category: &Category, score: f64) -> ResolvedMatch {
    ResolvedMatch::new(
        MatchKind::Category,
        &category.label,
        category.description.clone(),
        format!("/explorer/category/{}", category.id),
        score,
    )
}

#[cfg(test)]
mod tests {
    include!("catalog.test.rs");
}
