use crate::aggregate::{derive_corpus, derive_regions, AggregateParams, CorpusStats};
use crate::config::{AppConfig, InputConfig};
use crate::data::{load_libraries, load_regions};
use crate::fetch::fetch_all;
use crate::matcher::{augment, spatial_join};
use crate::region::RegionIndex;
use crate::tabular::parse_table;
use crate::types::AugmentedPoint;
use anyhow::{anyhow, Result};
use tracing::info;

/// Raw text of every configured input, in config order.
#[derive(Debug, Clone)]
pub struct Sources {
    pub boundaries: String,
    pub tables: Vec<String>,
    pub libraries: Option<String>,
}

/// Everything the renderer needs once the pipeline has run.
#[derive(Debug, Clone)]
pub struct Enriched {
    pub index: RegionIndex,
    pub params: AggregateParams,
    pub stats: CorpusStats,
    pub points: Vec<AugmentedPoint>,
    pub unmatched: usize,
}

/// Fetches all inputs as one batch; the first failure aborts the run.
pub async fn fetch_sources(input: &InputConfig) -> Result<Sources> {
    let mut batch = vec![input.boundaries.clone()];
    batch.extend(input.tables.iter().map(|t| t.source.clone()));
    batch.extend(input.libraries.iter().cloned());

    let mut texts = fetch_all(&batch).await?.into_iter();
    let boundaries = texts.next().ok_or_else(|| anyhow!("Boundary source missing from batch"))?;
    let tables: Vec<String> = texts.by_ref().take(input.tables.len()).collect();
    let libraries = texts.next();

    Ok(Sources {
        boundaries,
        tables,
        libraries,
    })
}

/// Seed, merge, derive per region, derive corpus, then join points.
#[tracing::instrument(skip_all, fields(tables = sources.tables.len()))]
pub fn run(config: &AppConfig, sources: &Sources) -> Result<Enriched> {
    let regions = load_regions(&sources.boundaries, &config.input.province)?;
    let mut index = RegionIndex::seed(regions, &config.metric_defaults());

    for (table, text) in config.input.tables.iter().zip(&sources.tables) {
        let rows = parse_table(text, &table.layout())?;
        let report = index.merge(&rows, &table.metric, table.shape(), table.adjust.as_ref());
        info!(
            metric = %table.metric,
            rows = rows.len(),
            applied = report.applied,
            discarded = report.discarded,
            "Merged table"
        );
    }

    let params = config.processing.clone();
    derive_regions(&mut index, &params);
    let stats = derive_corpus(&mut index, &params);

    let (points, unmatched) = match &sources.libraries {
        Some(text) => {
            let observations = load_libraries(text)?;
            let matches = spatial_join(observations, &index);
            let unmatched = matches.iter().filter(|m| !m.is_matched()).count();
            (augment(matches, &index), unmatched)
        }
        None => (Vec::new(), 0),
    };

    info!(
        regions = index.regions().len(),
        keys = index.len(),
        points = points.len(),
        unmatched,
        "Pipeline finished"
    );

    Ok(Enriched {
        index,
        params,
        stats,
        points,
        unmatched,
    })
}
