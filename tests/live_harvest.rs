use chrono::NaiveDate;
use form4kit::{
    FORM_4_FILTER, FilingQuery, HarvestConfig, Harvester, MetadataSource, SeenUrls, resolve,
};

fn live_harvester() -> Harvester {
    let config = HarvestConfig::from_env().expect("SEC_API_KEY must be set for live tests");
    Harvester::with_config(config).unwrap()
}

#[tokio::test]
#[ignore]
async fn query_one_page() {
    let harvester = live_harvester();
    let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();

    let page = harvester
        .query_filings(&FilingQuery::new(FORM_4_FILTER, date, 50, 0))
        .await
        .unwrap();

    assert!(!page.is_empty());
    assert!(page.len() <= 50);
    for filing in &page.filings {
        assert_eq!(filing.form_type.as_deref(), Some("4"));
    }
}

#[tokio::test]
#[ignore]
async fn download_resolved_documents() {
    let harvester = live_harvester();
    let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();

    let page = harvester
        .query_filings(&FilingQuery::new(FORM_4_FILTER, date, 5, 0))
        .await
        .unwrap();

    let mut seen = SeenUrls::new();
    let urls: Vec<String> = page
        .filings
        .iter()
        .filter_map(|filing| resolve(filing, harvester.archives_url(), &mut seen))
        .collect();

    let documents = harvester.download_all(&urls).await.unwrap();
    assert_eq!(documents.len(), urls.len());
}
