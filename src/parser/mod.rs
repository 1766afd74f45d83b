pub mod dom;
pub mod extract;

use anyhow::{bail, Context, Result};
use scraper::Html;
use thiserror::Error;
use tracing::{info, warn};

use crate::captcha::{CaptchaGuard, CaptchaState};
use crate::config::GrabConfig;
use crate::record::CompanyRecord;
use crate::session::{snapshot, Session, SessionError};
use extract::{categories, company, goods, hours, phones, reviews};

/// Why a single field came back empty. Never leaves the extractor that hit it.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("no element found for {0}")]
    Missing(&'static str),
    #[error("element has no `{0}` attribute")]
    MissingAttr(String),
    #[error("cannot parse {what} from {text:?}")]
    Parse { what: &'static str, text: String },
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Collapse a field result to its value, logging and defaulting on failure.
pub fn or_default<T: Default>(field: &'static str, result: Result<T, ExtractError>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            warn!("[{}] {}", field, e);
            T::default()
        }
    }
}

/// All field extractors with their selectors compiled once up front.
pub struct Extractor {
    company: company::CompanyFields,
    hours: hours::OpeningHours,
    goods: goods::Goods,
    phones: phones::PhoneHarvester,
    categories: categories::Categories,
    reviews: reviews::ReviewPager,
}

impl Extractor {
    pub fn new(config: &GrabConfig) -> Result<Self> {
        let sel = &config.selectors;
        Ok(Self {
            company: company::CompanyFields::new(sel, &config.origin)?,
            hours: hours::OpeningHours::new(sel)?,
            goods: goods::Goods::new(sel)?,
            phones: phones::PhoneHarvester::new(sel, config.phone_retry_pause_ms)?,
            categories: categories::Categories::new(sel)?,
            reviews: reviews::ReviewPager::new(&config.reviews)?,
        })
    }

    /// Run every field extractor against one snapshot. Each field fails
    /// independently; the reviews extractor runs last because it scrolls the
    /// live page.
    pub fn extract_record(&self, doc: &Html, session: &mut dyn Session) -> CompanyRecord {
        CompanyRecord {
            name: self.company.name(doc),
            address: self.company.address(doc),
            url: self.company.url(doc),
            id: self.company.id(doc),
            website: self.company.website(doc),
            opening_hours: self.hours.extract(doc),
            goods: self.goods.extract(doc),
            phones: self
                .phones
                .harvest(doc, session)
                .into_iter()
                .map(|p| p.into_inner())
                .collect(),
            categories: self.categories.extract(doc),
            rating: self.company.rating(doc),
            reviews: self.reviews.load(doc, session),
        }
    }
}

/// Captcha gate → snapshot → all fields.
pub fn process_listing(
    extractor: &Extractor,
    guard: &CaptchaGuard,
    session: &mut dyn Session,
) -> Result<CompanyRecord> {
    if guard.check(session) == CaptchaState::Challenged {
        bail!("listing is still behind a captcha");
    }
    let doc = snapshot(session).context("Failed to read listing page")?;
    let record = extractor.extract_record(&doc, session);
    info!(
        "Extracted '{}': {} phones, {} goods, {} reviews",
        record.name,
        record.phones.len(),
        record.goods.len(),
        record.reviews.len()
    );
    Ok(record)
}
