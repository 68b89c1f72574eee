use anyhow::{Context, Result};
use log::{error, info};
use radiosim_common::{Snapshot, VoxelRecord};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Serialisation used for the snapshot series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFormat {
    Json,
    Bincode,
    MessagePack,
}

impl SnapshotFormat {
    /// Parses `output.format`. Unknown names fall back to JSON.
    pub fn from_config(format: Option<&str>) -> Self {
        match format.unwrap_or("json") {
            "json" => SnapshotFormat::Json,
            "bincode" => SnapshotFormat::Bincode,
            "messagepack" => SnapshotFormat::MessagePack,
            other => {
                error!("Unknown output format: {}. Using JSON instead.", other);
                SnapshotFormat::Json
            }
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            SnapshotFormat::Json => "json",
            SnapshotFormat::Bincode => "bin",
            SnapshotFormat::MessagePack => "msgpack",
        }
    }
}

/// Writes the snapshot series to `{base}_snapshots.{ext}` and returns the path.
pub fn write_snapshots(snapshots: &[Snapshot], base_filename: &str, format: SnapshotFormat) -> Result<PathBuf> {
    let path = PathBuf::from(format!("{}_snapshots.{}", base_filename, format.extension()));
    let file = File::create(&path).with_context(|| format!("Error creating snapshot file '{}'", path.display()))?;
    let mut writer = BufWriter::new(file);

    match format {
        SnapshotFormat::Json => serde_json::to_writer(&mut writer, snapshots)
            .context("Error serializing snapshots to JSON")?,
        SnapshotFormat::Bincode => bincode::serialize_into(&mut writer, snapshots)
            .context("Error serializing snapshots to bincode")?,
        SnapshotFormat::MessagePack => rmp_serde::encode::write(&mut writer, snapshots)
            .context("Error serializing snapshots to MessagePack")?,
    }
    writer.flush()?;

    info!("{} snapshots saved to {}", snapshots.len(), path.display());
    Ok(path)
}

/// Writes the per-voxel table as CSV with a header row.
pub fn write_voxel_table<P: AsRef<Path>>(records: &[VoxelRecord], path: P) -> Result<()> {
    let path = path.as_ref();
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("Error creating CSV file '{}'", path.display()))?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    info!("Voxel table ({} rows) saved to {}", records.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("radiosim-{}-{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn sample() -> Vec<Snapshot> {
        vec![
            Snapshot {
                tick: 24,
                healthy: 10,
                cancer: 3,
                oar: 0,
                centroid: (1.0, 2.0, 3.0),
                tumor_radius: Some(3.0),
                dose_delivered: 0.0,
            },
            Snapshot {
                tick: 48,
                healthy: 9,
                cancer: 0,
                oar: 0,
                centroid: (1.0, 2.0, 3.0),
                tumor_radius: None,
                dose_delivered: 2.0,
            },
        ]
    }

    #[test]
    fn format_names() {
        assert_eq!(SnapshotFormat::from_config(None), SnapshotFormat::Json);
        assert_eq!(SnapshotFormat::from_config(Some("bincode")), SnapshotFormat::Bincode);
        assert_eq!(SnapshotFormat::from_config(Some("messagepack")), SnapshotFormat::MessagePack);
        assert_eq!(SnapshotFormat::from_config(Some("yaml")), SnapshotFormat::Json);
    }

    #[test]
    fn json_snapshots_omit_missing_radius() {
        let dir = scratch_dir("json");
        let base = dir.join("run");
        let path = write_snapshots(&sample(), base.to_str().unwrap(), SnapshotFormat::Json).unwrap();
        assert!(path.to_string_lossy().ends_with("run_snapshots.json"));
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.matches("tumor_radius").count(), 1);
        let back: Vec<Snapshot> = serde_json::from_str(&text).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back[1].tumor_radius, None);
    }

    #[test]
    fn voxel_table_has_header_and_rows() {
        let dir = scratch_dir("csv");
        let path = dir.join("voxels.csv");
        let records = vec![VoxelRecord {
            x: 0,
            y: 1,
            z: 2,
            density: -1,
            healthy: 1,
            cancer: 1,
            oar: 0,
            glucose: 100.0,
            oxygen: 1000.0,
            voxel_type: -1,
        }];
        write_voxel_table(&records, &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("x,y,z,density,healthy,cancer,oar,glucose,oxygen,voxel_type"));
        assert_eq!(lines.next(), Some("0,1,2,-1,1,1,0,100.0,1000.0,-1"));
    }
}
