use indicatif::{
    ProgressBar,
    ProgressStyle,
};
use ionnet::io::{
    NetworkReport,
    build_reports,
};
use ionnet::networking::logic::{
    create_annotation_networks_grouped,
    recalc_all_annotation_networks,
    renumber_networks,
    sort_ion_identities,
    split_by_groups,
    stream_networks,
};
use ionnet::networking::{
    IonNetworkLibrary,
    find_modification_relations,
    search,
};
use ionnet::FeatureList;
use std::time::Instant;
use tracing::{
    debug,
    info,
    instrument,
};

use crate::config::IonNetworkingConfig;
use crate::error::CliError;

const STAGES: u64 = 6;

/// Runs search, network building, refinement and reporting over `list`.
#[instrument(skip_all)]
pub fn run_pipeline(
    list: &mut FeatureList,
    config: &IonNetworkingConfig,
) -> Result<Vec<NetworkReport>, CliError> {
    let start = Instant::now();
    let style = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}",
    )
    .map_err(|e| CliError::DataProcessing(e.to_string()))?;
    let pb = ProgressBar::new(STAGES).with_style(style);

    pb.set_message("building ion library");
    let library = IonNetworkLibrary::new(config.library_config());
    let params = config.parameters();
    info!("Searching with {} ion types", library.len());
    pb.inc(1);

    pb.set_message("searching adducts");
    let links = search(list, &library, &params)?;
    pb.inc(1);

    pb.set_message("building networks");
    let mut built =
        create_annotation_networks_grouped(list, params.tolerance.ms, config.use_grouping);
    if config.split_by_groups {
        split_by_groups(list, &mut built);
    }
    debug!("{} networks after building", built.len());
    pb.inc(1);

    pb.set_message("refining identities");
    sort_ion_identities(list, config.use_grouping);
    recalc_all_annotation_networks(list, true);
    sort_ion_identities(list, config.use_grouping);
    pb.inc(1);

    pb.set_message("collecting networks");
    let mut nets = stream_networks(list, config.only_best, None);
    nets.retain(|n| {
        list.network(*n)
            .is_some_and(|x| x.len() >= config.min_network_size)
    });
    if config.find_relations {
        let related = find_modification_relations(
            list,
            &nets,
            &library.config().modifications,
            &params.tolerance.ms,
        );
        debug!("{} network pairs related by modifications", related);
    }
    renumber_networks(list, &mut nets);
    config.sort_by.sort(list, &mut nets);
    pb.inc(1);

    pb.set_message("writing reports");
    let reports = build_reports(list, &nets);
    pb.inc(1);
    pb.finish_and_clear();

    info!(
        "{} adduct links, {} networks reported in {:?}",
        links,
        reports.len(),
        start.elapsed()
    );
    Ok(reports)
}
