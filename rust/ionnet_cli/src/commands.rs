use ionnet::io::{
    FeatureTable,
    NetworkReport,
    read_feature_table,
};
use serde::Serialize;
use std::fs::File;
use std::io::{
    self,
    BufWriter,
    Write,
};
use std::path::Path;
use std::time::Instant;
use tracing::{
    info,
    instrument,
};

use crate::cli::{
    RunArgs,
    SerializationFormat,
    WriteTemplateArgs,
};
use crate::config::IonNetworkingConfig;
use crate::error::CliError;
use crate::processing::run_pipeline;

/// Main function for the 'run' subcommand.
#[instrument]
pub fn main_run(args: RunArgs) -> Result<(), CliError> {
    let mut config: IonNetworkingConfig =
        serde_json::from_str(&std::fs::read_to_string(&args.config)?)?;
    if let Some(min_height) = args.min_height {
        config.min_height = min_height;
    }
    if let Some(use_grouping) = args.use_grouping {
        config.use_grouping = use_grouping;
    }
    config.validate()?;
    info!("Using config: {:#?}", config);

    info!("Loading feature table from {}", args.features.display());
    let mut list = read_feature_table(&args.features)?;
    info!("Loaded {} rows", list.rows().len());

    let start = Instant::now();
    let reports = run_pipeline(&mut list, &config)?;

    std::fs::create_dir_all(&args.output_path)?;
    let out_name = match args.format {
        SerializationFormat::Ndjson => "networks.ndjson",
        SerializationFormat::Json | SerializationFormat::PrettyJson => "networks.json",
    };
    let out_path = args.output_path.join(out_name);
    write_reports(&reports, args.format, &out_path)?;

    println!("Wrote {} networks to {}", reports.len(), out_path.display());
    println!("Total processing and serialization took {:#?}", start.elapsed());
    Ok(())
}

fn write_reports(
    reports: &[NetworkReport],
    format: SerializationFormat,
    out_path: &Path,
) -> Result<(), CliError> {
    let file = File::create(out_path)?;
    let mut ser = JsonStreamSerializer::new(BufWriter::new(file), format);
    for report in reports {
        ser.serialize(report)?;
    }
    ser.finish()?;
    Ok(())
}

const CONFIG_TEMPLATE: &str = r#"{
  "mz_tolerance": { "da_or_ppm": { "da": 0.002, "ppm": 5.0 } },
  "rt_tolerance": { "minutes": 0.1 },
  "min_height": 0.0,
  "check_mode": "all",
  "polarity": "positive",
  "max_molecules": 2,
  "max_charge": 2,
  "adducts": ["H", "Na", "K", "NH4"],
  "modifications": ["H2O", "NH3", "CO2"],
  "use_grouping": false,
  "split_by_groups": false,
  "min_network_size": 2,
  "only_best": true,
  "find_relations": true,
  "sort_by": { "property": "rt", "direction": "ascending" }
}"#;

/// Main function for the 'write-template' subcommand.
pub fn main_write_template(args: WriteTemplateArgs) -> Result<(), CliError> {
    let target_dir = args.output_path;
    std::fs::create_dir_all(&target_dir)?;

    let config_path = target_dir.join("config_template.json");
    std::fs::write(&config_path, CONFIG_TEMPLATE)?;
    println!("Wrote config template to: {}", config_path.display());

    let features_path = target_dir.join("feature_table_template.json");
    std::fs::write(
        &features_path,
        serde_json::to_string_pretty(&FeatureTable::template())?,
    )?;
    println!(
        "Wrote feature table template to: {}",
        features_path.display()
    );
    Ok(())
}

pub struct JsonStreamSerializer<W: Write> {
    writer: W,
    format: SerializationFormat,
    is_first: bool,
}

impl<W: Write> JsonStreamSerializer<W> {
    pub fn new(writer: W, format: SerializationFormat) -> Self {
        Self {
            writer,
            format,
            is_first: true,
        }
    }

    /// Serializes an item based on the selected format.
    pub fn serialize<T: Serialize>(&mut self, item: &T) -> io::Result<()> {
        match self.format {
            SerializationFormat::Ndjson => {
                serde_json::to_writer(&mut self.writer, item).map_err(io::Error::other)?;
                self.writer.write_all(b"\n")?;
            }
            SerializationFormat::Json | SerializationFormat::PrettyJson => {
                if self.is_first {
                    self.writer.write_all(b"[")?;
                    self.is_first = false;
                } else {
                    self.writer.write_all(b",")?;
                }

                if matches!(self.format, SerializationFormat::PrettyJson) {
                    serde_json::to_writer_pretty(&mut self.writer, item)
                } else {
                    serde_json::to_writer(&mut self.writer, item)
                }
                .map_err(io::Error::other)?;
            }
        }
        Ok(())
    }

    /// Closes the JSON array and flushes.
    pub fn finish(mut self) -> io::Result<()> {
        match self.format {
            SerializationFormat::Json | SerializationFormat::PrettyJson => {
                if self.is_first {
                    self.writer.write_all(b"[]")?;
                } else {
                    self.writer.write_all(b"]")?;
                }
            }
            SerializationFormat::Ndjson => {}
        }
        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ionnet::MzTolerance;
    use ionnet::networking::SortingProperty;

    #[test]
    fn test_config_template_deserializable() {
        let config: IonNetworkingConfig = serde_json::from_str(CONFIG_TEMPLATE).unwrap();
        assert!(matches!(
            config.mz_tolerance,
            MzTolerance::AbsoluteOrPpm { .. }
        ));
        assert_eq!(config.sort_by.property, SortingProperty::Rt);
        assert!(config.validate().is_ok());
        let library = config.library_config();
        assert_eq!(library.adducts.len(), 4);
        assert_eq!(library.modifications.len(), 3);
    }

    #[test]
    fn test_feature_table_template_round_trips() {
        let json = serde_json::to_string_pretty(&FeatureTable::template()).unwrap();
        let table = FeatureTable::from_json_str(&json).unwrap();
        assert_eq!(table.rows.len(), 3);
    }

    #[test]
    fn test_stream_serializer_formats() {
        let mut buf = Vec::new();
        JsonStreamSerializer::new(&mut buf, SerializationFormat::Json)
            .finish()
            .unwrap();
        assert_eq!(buf, b"[]");

        let mut buf = Vec::new();
        let mut ser = JsonStreamSerializer::new(&mut buf, SerializationFormat::Json);
        ser.serialize(&1).unwrap();
        ser.serialize(&2).unwrap();
        ser.finish().unwrap();
        assert_eq!(buf, b"[1,2]");

        let mut buf = Vec::new();
        let mut ser = JsonStreamSerializer::new(&mut buf, SerializationFormat::Ndjson);
        ser.serialize(&"a").unwrap();
        ser.serialize(&"b").unwrap();
        ser.finish().unwrap();
        assert_eq!(buf, b"\"a\"\n\"b\"\n");
    }
}
