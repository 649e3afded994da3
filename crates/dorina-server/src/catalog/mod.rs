//! Filesystem catalog of genomes and regulators
//!
//! Layout under the data path:
//!
//! ```text
//! genomes/<genome>/genome.json            id, label, scientific, weight, assemblies{}
//! genomes/<genome>/<assembly>/*.gff       gene annotations
//! genomes/<genome>/<assembly>/<tissue>/   one directory per tissue
//! regulators/<genome>/<assembly>/<name>.json
//! regulators/<genome>/<assembly>/<name>.bed
//! ```

use dorina_common::{types::gene_from_annotations, DorinaError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{
    collections::{BTreeMap, BTreeSet},
    path::{Path, PathBuf},
};

const GENOMES_DIR: &str = "genomes";
const REGULATORS_DIR: &str = "regulators";
const GENOME_FILE: &str = "genome.json";

/// GFF column holding `;`-separated attributes
const GFF_ATTRIBUTES_COLUMN: usize = 8;

/// A genome as described by its `genome.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genome {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub scientific: Option<String>,
    #[serde(default)]
    pub weight: Option<i64>,
    #[serde(default)]
    pub assemblies: BTreeMap<String, Map<String, Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A genome without its assembly table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenomeSummary {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scientific: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl From<Genome> for GenomeSummary {
    fn from(genome: Genome) -> Self {
        Self {
            id: genome.id,
            label: genome.label,
            scientific: genome.scientific,
            weight: genome.weight,
            extra: genome.extra,
        }
    }
}

/// One assembly of a genome
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assembly {
    pub id: String,
    pub genome: String,
    /// Numeric suffix of the id (`hg19` → 19), used for ordering in the UI
    pub weight: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn assembly_weight(id: &str) -> i64 {
    id.get(2..).and_then(|digits| digits.parse().ok()).unwrap_or(0)
}

/// Reject path components that could escape the data directory
pub fn is_safe_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.contains('\0')
}

fn require_safe(name: &str) -> Result<()> {
    if is_safe_name(name) {
        Ok(())
    } else {
        Err(DorinaError::InvalidName(name.to_string()))
    }
}

/// Directory entries of `path`, sorted by name; a missing directory is empty
async fn entries(path: &Path) -> Result<Vec<(String, PathBuf, bool)>> {
    let mut dir = match tokio::fs::read_dir(path).await {
        Ok(dir) => dir,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut found = Vec::new();
    while let Some(entry) = dir.next_entry().await? {
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        let is_dir = entry.file_type().await?.is_dir();
        found.push((name, entry.path(), is_dir));
    }
    found.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(found)
}

#[derive(Debug, Clone)]
pub struct Catalog {
    data_path: PathBuf,
}

impl Catalog {
    pub fn new(data_path: impl Into<PathBuf>) -> Self {
        Self {
            data_path: data_path.into(),
        }
    }

    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    /// Every genome with a readable `genome.json`
    pub async fn genomes(&self) -> Result<Vec<Genome>> {
        let mut genomes = Vec::new();
        for (name, path, is_dir) in entries(&self.data_path.join(GENOMES_DIR)).await? {
            if !is_dir {
                continue;
            }
            let file = path.join(GENOME_FILE);
            let raw = match tokio::fs::read_to_string(&file).await {
                Ok(raw) => raw,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            match serde_json::from_str::<Genome>(&raw) {
                Ok(genome) => genomes.push(genome),
                Err(e) => tracing::warn!(genome = %name, error = %e, "Skipping unreadable genome.json"),
            }
        }
        Ok(genomes)
    }

    pub async fn genome_summaries(&self) -> Result<Vec<GenomeSummary>> {
        Ok(self.genomes().await?.into_iter().map(GenomeSummary::from).collect())
    }

    /// Assemblies of every genome, or of one genome when `genome` is given
    pub async fn assemblies(&self, genome: Option<&str>) -> Result<Vec<Assembly>> {
        let mut assemblies = Vec::new();
        for g in self.genomes().await? {
            if genome.is_some_and(|wanted| wanted != g.id) {
                continue;
            }
            for (id, extra) in g.assemblies {
                assemblies.push(Assembly {
                    weight: assembly_weight(&id),
                    id,
                    genome: g.id.clone(),
                    extra,
                });
            }
        }
        Ok(assemblies)
    }

    /// Regulator metadata for an assembly, keyed by regulator name
    pub async fn regulators(&self, assembly: &str) -> Result<BTreeMap<String, Value>> {
        require_safe(assembly)?;
        let mut regulators = BTreeMap::new();
        for (_, genome_dir, is_dir) in entries(&self.data_path.join(REGULATORS_DIR)).await? {
            if !is_dir {
                continue;
            }
            for (file, path, _) in entries(&genome_dir.join(assembly)).await? {
                let Some(name) = file.strip_suffix(".json") else {
                    continue;
                };
                let raw = tokio::fs::read_to_string(&path).await?;
                regulators.insert(name.to_string(), serde_json::from_str(&raw)?);
            }
        }
        Ok(regulators)
    }

    /// Path of a regulator's BED file
    pub async fn regulator_path(&self, assembly: &str, name: &str) -> Result<PathBuf> {
        require_safe(assembly)?;
        require_safe(name)?;
        for (_, genome_dir, is_dir) in entries(&self.data_path.join(REGULATORS_DIR)).await? {
            if !is_dir {
                continue;
            }
            let candidate = genome_dir.join(assembly).join(format!("{}.bed", name));
            if tokio::fs::try_exists(&candidate).await? {
                return Ok(candidate);
            }
        }
        Err(DorinaError::RegulatorNotFound(format!("{}/{}", assembly, name)))
    }

    /// Directory holding an assembly's annotation files
    async fn assembly_dir(&self, assembly: &str) -> Result<PathBuf> {
        require_safe(assembly)?;
        for (_, genome_dir, is_dir) in entries(&self.data_path.join(GENOMES_DIR)).await? {
            let candidate = genome_dir.join(assembly);
            if is_dir && tokio::fs::try_exists(&candidate).await? {
                return Ok(candidate);
            }
        }
        Err(DorinaError::GenomeNotFound(assembly.to_string()))
    }

    /// Distinct gene identifiers from an assembly's GFF files, sorted
    pub async fn genes(&self, assembly: &str) -> Result<Vec<String>> {
        let dir = self.assembly_dir(assembly).await?;
        let mut genes = BTreeSet::new();
        for (file, path, is_dir) in entries(&dir).await? {
            if is_dir || !file.ends_with(".gff") {
                continue;
            }
            let raw = tokio::fs::read_to_string(&path).await?;
            genes.extend(
                raw.lines()
                    .filter(|line| !line.starts_with('#'))
                    .filter_map(|line| line.split('\t').nth(GFF_ATTRIBUTES_COLUMN))
                    .filter_map(gene_from_annotations)
                    .map(str::to_string),
            );
        }
        Ok(genes.into_iter().collect())
    }

    /// Tissue directories of an assembly
    pub async fn tissues(&self, assembly: &str) -> Result<Vec<String>> {
        require_safe(assembly)?;
        let mut tissues = Vec::new();
        for (_, genome_dir, is_dir) in entries(&self.data_path.join(GENOMES_DIR)).await? {
            if !is_dir {
                continue;
            }
            tissues.extend(
                entries(&genome_dir.join(assembly))
                    .await?
                    .into_iter()
                    .filter(|(_, _, is_dir)| *is_dir)
                    .map(|(name, _, _)| name),
            );
        }
        Ok(tissues)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> (tempfile::TempDir, Catalog) {
        let dir = tempfile::tempdir().unwrap();
        fixtures::write_data_tree(dir.path());
        let catalog = Catalog::new(dir.path());
        (dir, catalog)
    }

    #[tokio::test]
    async fn test_genomes_and_assemblies() {
        let (_dir, catalog) = catalog();
        let genomes = catalog.genome_summaries().await.unwrap();
        assert_eq!(genomes.len(), 1);
        assert_eq!(genomes[0].id, "h_sapiens");
        let json = serde_json::to_value(&genomes[0]).unwrap();
        assert!(json.get("assemblies").is_none());

        let assemblies = catalog.assemblies(Some("h_sapiens")).await.unwrap();
        assert_eq!(assemblies.len(), 1);
        assert_eq!(assemblies[0].id, "hg19");
        assert_eq!(assemblies[0].weight, 19);
        assert!(catalog.assemblies(Some("m_musculus")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_regulators() {
        let (_dir, catalog) = catalog();
        let regulators = catalog.regulators("hg19").await.unwrap();
        assert_eq!(regulators.len(), 1);
        assert_eq!(regulators["PARCLIP_scifi"]["experiment"], "PARCLIP");
        assert!(catalog.regulators("mm10").await.unwrap().is_empty());

        assert!(catalog.regulator_path("hg19", "PARCLIP_scifi").await.is_ok());
        assert!(matches!(
            catalog.regulator_path("hg19", "missing").await,
            Err(DorinaError::RegulatorNotFound(_))
        ));
        assert!(matches!(
            catalog.regulator_path("hg19", "../../etc/passwd").await,
            Err(DorinaError::InvalidName(_))
        ));
    }

    #[tokio::test]
    async fn test_genes_and_tissues() {
        let (_dir, catalog) = catalog();
        assert_eq!(
            catalog.genes("hg19").await.unwrap(),
            vec!["gene01.01", "gene01.02", "gene01.03"]
        );
        assert!(matches!(
            catalog.genes("mm10").await,
            Err(DorinaError::GenomeNotFound(_))
        ));
        assert_eq!(catalog.tissues("hg19").await.unwrap(), vec!["brain", "liver"]);
    }

    #[test]
    fn test_is_safe_name() {
        assert!(is_safe_name("hg19"));
        assert!(!is_safe_name(".."));
        assert!(!is_safe_name("a/b"));
        assert!(!is_safe_name(""));
    }
}
