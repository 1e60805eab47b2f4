//! Sample catalog seeding
//!
//! Loads the five marketing resources and, optionally, placeholder files
//! for them under the resource root so downloads work out of the box.

use serde_json::json;
use tracing::info;

use crate::db::{Metadata, NewResource, Resource, ResourceFilter};
use crate::files::ResourceFiles;
use crate::store::Stores;
use crate::types::Result;

#[derive(Debug, Clone, Default)]
pub struct SeedOptions {
    /// Delete the existing catalog before seeding
    pub reset: bool,
    /// Also write placeholder files for every sample resource
    pub write_files: bool,
}

#[derive(Debug, Default)]
pub struct SeedReport {
    pub removed: u64,
    pub inserted: Vec<Resource>,
    pub files_written: usize,
    /// Seeding was skipped because the catalog already had resources
    pub skipped: bool,
}

fn metadata(value: serde_json::Value) -> Metadata {
    match value {
        serde_json::Value::Object(map) => map,
        _ => Metadata::new(),
    }
}

fn sample(
    title: &str,
    description: &str,
    category: &str,
    file_path: &str,
    file_size: i64,
    featured: bool,
    meta: serde_json::Value,
) -> NewResource {
    NewResource {
        title: title.to_string(),
        description: description.to_string(),
        resource_type: "pdf".to_string(),
        category: category.to_string(),
        file_path: file_path.to_string(),
        file_size: Some(file_size),
        featured,
        metadata: metadata(meta),
    }
}

/// The sample catalog
pub fn sample_resources() -> Vec<NewResource> {
    vec![
        sample(
            "GameVerse Marketplace Security Case Study",
            "Comprehensive analysis of implementing fraud detection and trust & safety \
             measures for a gaming marketplace platform.",
            "case-studies",
            "case-studies/gameverse-case-study.pdf",
            2_048_000,
            true,
            json!({
                "industry": "Gaming",
                "company_size": "Series B Startup",
                "implementation_time": "6 months",
                "fraud_reduction": "85%"
            }),
        ),
        sample(
            "E-commerce Fraud Detection Implementation",
            "Real-world case study of implementing ML-based fraud detection for a major \
             e-commerce platform.",
            "case-studies",
            "case-studies/ecommerce-fraud-detection.pdf",
            1_536_000,
            true,
            json!({
                "industry": "E-commerce",
                "company_size": "Fortune 500",
                "implementation_time": "12 months",
                "fraud_reduction": "92%"
            }),
        ),
        sample(
            "AI-Powered Fraud Detection Guide",
            "Complete guide to implementing artificial intelligence and machine learning \
             for fraud detection in digital marketplaces.",
            "whitepapers",
            "whitepapers/ai-fraud-detection-guide.pdf",
            3_072_000,
            true,
            json!({
                "pages": 45,
                "topics": ["Machine Learning", "Fraud Detection", "Risk Assessment"],
                "level": "Intermediate to Advanced"
            }),
        ),
        sample(
            "Marketplace Trust & Safety Playbook",
            "Essential strategies and best practices for building trust and safety \
             systems in online marketplaces.",
            "guides",
            "guides/marketplace-trust-safety-playbook.pdf",
            2_560_000,
            false,
            json!({
                "pages": 32,
                "topics": ["Trust & Safety", "Policy Development", "User Protection"],
                "level": "Beginner to Intermediate"
            }),
        ),
        sample(
            "Scaling Trust & Safety Operations",
            "Presentation on strategies for scaling trust and safety operations in \
             high-growth marketplaces.",
            "presentations",
            "presentations/scaling-trust-safety.pdf",
            5_120_000,
            false,
            json!({
                "slides": 28,
                "event": "Trust & Safety Summit 2024",
                "topics": ["Operations Scaling", "Team Building", "Process Optimization"]
            }),
        ),
    ]
}

/// Placeholder body written in place of the real PDF
pub fn placeholder_contents(resource: &NewResource) -> String {
    format!(
        "SAMPLE RESOURCE FILE\n\
         Title: {} - Sample Content\n\
         This is a placeholder file for testing the resource management system.\n\
         In production, this would be replaced with actual PDF content.\n\
         File path: {}\n",
        resource.title, resource.file_path
    )
}

/// Write placeholder files for the sample catalog, returning how many
pub async fn write_placeholder_files(files: &ResourceFiles) -> Result<usize> {
    let samples = sample_resources();
    for resource in &samples {
        let path = files
            .write(&resource.file_path, placeholder_contents(resource).as_bytes())
            .await?;
        info!("Created: {}", path.display());
    }
    Ok(samples.len())
}

/// Seed the catalog.
///
/// Without `reset` an already populated catalog is left untouched.
pub async fn seed_catalog(
    stores: &Stores,
    files: &ResourceFiles,
    options: &SeedOptions,
) -> Result<SeedReport> {
    let mut report = SeedReport::default();

    if options.reset {
        report.removed = stores
            .timed("clear_resources", stores.resources.clear())
            .await?;
        info!("Cleared {} existing resources", report.removed);
    } else {
        let existing = stores
            .timed("list_resources", stores.resources.list(&ResourceFilter::default()))
            .await?;
        if !existing.is_empty() {
            info!(
                "Catalog already holds {} resources, skipping (use --reset to replace)",
                existing.len()
            );
            report.skipped = true;
            return Ok(report);
        }
    }

    for new in sample_resources() {
        let resource = stores
            .timed("create_resource", stores.resources.create(new))
            .await?;
        info!(resource_id = %resource.id, "Inserted {}", resource.title);
        report.inserted.push(resource);
    }

    if options.write_files {
        report.files_written = write_placeholder_files(files).await?;
    }

    Ok(report)
}
