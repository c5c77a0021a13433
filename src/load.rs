extern crate flate2;
extern crate memmap;
extern crate regex;

use crate::data::CelestialBody;
use crate::error::{Error, Result};
use crate::parse;

use memmap::Mmap;
use regex::Regex;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io;
use std::io::{BufRead, Read};
use std::path::Path;

use flate2::read::GzDecoder;
use glob::glob;

#[allow(non_camel_case_types)]
#[derive(Copy, Debug, Clone, Eq, PartialEq, Hash)]
pub enum ColId {
    id,
    name,
    ra,
    dec,
    dist,
    mag,
}

impl ColId {
    pub fn to_str(&self) -> &str {
        match self {
            ColId::id => "id",
            ColId::name => "name",
            ColId::ra => "ra",
            ColId::dec => "dec",
            ColId::dist => "dist",
            ColId::mag => "mag",
        }
    }

    pub fn from_str(input: &str) -> Option<ColId> {
        match input {
            "id" => Some(ColId::id),
            "source_id" => Some(ColId::id),
            "sourceid" => Some(ColId::id),
            "name" => Some(ColId::name),
            "pl_name" => Some(ColId::name),
            "ra" => Some(ColId::ra),
            "dec" => Some(ColId::dec),
            "de" => Some(ColId::dec),
            "dist" => Some(ColId::dist),
            "distance" => Some(ColId::dist),
            "sy_dist" => Some(ColId::dist),
            "distance_gspphot" => Some(ColId::dist),
            "dist_phot" => Some(ColId::dist),
            "mag" => Some(ColId::mag),
            "gmag" => Some(ColId::mag),
            "appmag" => Some(ColId::mag),
            "phot_g_mean_mag" => Some(ColId::mag),
            _ => None,
        }
    }
}

/**
 * Stars carry a magnitude and optionally an id. Exoplanets
 * must carry a name, which keys every output.
 **/
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CatalogKind {
    Stars,
    Exoplanets,
}

impl CatalogKind {
    fn required(&self) -> &'static [ColId] {
        match self {
            CatalogKind::Stars => &[ColId::ra, ColId::dec, ColId::dist],
            CatalogKind::Exoplanets => &[ColId::name, ColId::ra, ColId::dec, ColId::dist],
        }
    }
}

/**
 * One record of a JSON catalog. Unknown fields such as the
 * precomputed x_earth/y_earth/z_earth are ignored.
 **/
#[derive(Deserialize)]
struct JsonRecord {
    #[serde(alias = "id", alias = "pl_name")]
    name: Option<String>,
    ra: Option<f64>,
    dec: Option<f64>,
    #[serde(alias = "sy_dist", alias = "distance")]
    dist: Option<f64>,
    #[serde(alias = "phot_g_mean_mag")]
    mag: Option<f64>,
}

/**
 * A JSON catalog is either a list of records or an object
 * keyed by body name.
 **/
#[derive(Deserialize)]
#[serde(untagged)]
enum JsonCatalog {
    List(Vec<JsonRecord>),
    Keyed(BTreeMap<String, JsonRecord>),
}

pub struct Loader {
    pub kind: CatalogKind,
    // Quoted runs in a line, commas inside them do not separate fields
    pub quoted: Regex,
    // Maximum number of files to load in a directory
    pub max_files: i32,

    // Counts
    pub total_processed: u64,
    pub total_loaded: u64,
    pub rejected_dist: u64,
    pub rejected_fields: u64,
    pub rejected_range: u64,
    pub duplicates: u64,
}

impl Loader {
    pub fn new(kind: CatalogKind, max_files: i32) -> Self {
        Loader {
            kind,
            // The exoplanet archive quotes with '|', other tools with '"'
            quoted: Regex::new(r#"\|[^|]*\||"[^"]*""#).expect("Error: quote regex"),
            max_files,
            total_processed: 0,
            total_loaded: 0,
            rejected_dist: 0,
            rejected_fields: 0,
            rejected_range: 0,
            duplicates: 0,
        }
    }

    /**
     * Loads a catalog file, or every catalog file in a directory.
     * Fails if the path does not exist or nothing usable is found.
     **/
    pub fn load_dir(&mut self, dir: &str) -> Result<Vec<CelestialBody>> {
        let path = Path::new(dir);
        if !path.exists() {
            return Err(Error::MissingCatalog(dir.to_string()));
        }
        let mut list: Vec<CelestialBody> = Vec::new();

        if path.is_file() {
            self.load_file(dir, &mut list, 1, 1)?;
        } else {
            // glob directory
            let mut dir_glob: String = String::from(dir);
            dir_glob.push_str("/*");
            let mut files = Vec::new();
            for entry in glob(&dir_glob)? {
                match entry {
                    Ok(p) => {
                        if p.is_file() && is_catalog_file(&p.to_string_lossy()) {
                            files.push(p);
                        }
                    }
                    Err(e) => log::error!("Error: {:?}", e),
                }
            }
            files.sort();
            if self.max_files >= 0 {
                files.truncate(self.max_files as usize);
            }
            let count = files.len();
            for (i, p) in files.iter().enumerate() {
                self.load_file(&p.to_string_lossy(), &mut list, i + 1, count)?;
            }
        }

        if self.kind == CatalogKind::Exoplanets {
            list = self.dedup_names(list);
        }
        if list.is_empty() {
            return Err(Error::EmptyCatalog(dir.to_string()));
        }
        Ok(list)
    }

    /**
     * Loads a single file, being it json, csv.gz or csv
     **/
    pub fn load_file(
        &mut self,
        file: &str,
        list: &mut Vec<CelestialBody>,
        file_num: usize,
        file_count: usize,
    ) -> Result<()> {
        // Skip weird files
        if !is_catalog_file(file) {
            log::debug!("Skipping unknown file type: {}", file);
            return Ok(());
        }
        let before = list.len();
        let processed = self.total_processed;
        if file.ends_with(".json") {
            self.load_json(file, list)?;
        } else {
            self.load_csv(file, list)?;
        }
        self.log_file(
            list.len() - before,
            (self.total_processed - processed) as usize,
            file,
            file_num,
            file_count,
        );
        Ok(())
    }

    fn load_csv(&mut self, file: &str, list: &mut Vec<CelestialBody>) -> Result<()> {
        let f = File::open(file)?;
        // Zero-length files cannot be mapped
        if f.metadata()?.len() == 0 {
            return Ok(());
        }
        let mmap = unsafe { Mmap::map(&f)? };
        let is_gz = file.ends_with(".gz") || file.ends_with(".gzip");

        let mut reader: Box<dyn Read> = if is_gz {
            Box::new(GzDecoder::new(&mmap[..]))
        } else {
            Box::new(&mmap[..])
        };

        let mut indices: Option<HashMap<ColId, usize>> = None;
        for (i, line) in io::BufReader::new(reader.as_mut()).lines().enumerate() {
            let line = line?;
            let line_num = i + 1;
            // Skip comments and blank lines
            if line.starts_with('#') || line.trim().is_empty() {
                continue;
            }
            match &indices {
                None => indices = Some(self.parse_header(&line, file, line_num)?),
                Some(idx) => {
                    if let Some(body) = self.parse_line(&line, idx, file, line_num)? {
                        list.push(body);
                    }
                }
            }
        }
        Ok(())
    }

    fn load_json(&mut self, file: &str, list: &mut Vec<CelestialBody>) -> Result<()> {
        let f = File::open(file)?;
        let catalog: JsonCatalog = serde_json::from_reader(io::BufReader::new(f))
            .map_err(|e| Error::malformed(file, e.line(), e.to_string()))?;
        let records: Vec<(Option<String>, JsonRecord)> = match catalog {
            JsonCatalog::List(records) => records.into_iter().map(|r| (None, r)).collect(),
            JsonCatalog::Keyed(map) => map.into_iter().map(|(k, r)| (Some(k), r)).collect(),
        };
        for (key, record) in records {
            let name = key.or(record.name);
            if let Some(body) = self.create_body(name, record.ra, record.dec, record.dist, record.mag) {
                list.push(body);
            }
        }
        Ok(())
    }

    fn parse_header(&self, line: &str, file: &str, line_num: usize) -> Result<HashMap<ColId, usize>> {
        let mut indices = HashMap::new();
        for (i, token) in self.split_fields(line).into_iter().enumerate() {
            if let Some(col_id) = ColId::from_str(parse::clean_token(token)) {
                // First occurrence wins
                indices.entry(col_id).or_insert(i);
            }
        }
        for col_id in self.kind.required() {
            if !indices.contains_key(col_id) {
                return Err(Error::malformed(
                    file,
                    line_num,
                    format!("header lacks column '{}'", col_id.to_str()),
                ));
            }
        }
        Ok(indices)
    }

    /**
     * Splits a line on commas that are not inside a quoted run.
     * Tokens keep their quotes and padding, `parse::clean_token`
     * strips them.
     **/
    fn split_fields<'l>(&self, line: &'l str) -> Vec<&'l str> {
        let quoted: Vec<(usize, usize)> = self
            .quoted
            .find_iter(line)
            .map(|m| (m.start(), m.end()))
            .collect();
        let mut fields = Vec::new();
        let mut start = 0;
        for (i, _) in line.match_indices(',') {
            if quoted.iter().any(|&(s, e)| i > s && i < e) {
                continue;
            }
            fields.push(&line[start..i]);
            start = i + 1;
        }
        fields.push(&line[start..]);
        fields
    }

    fn get_index(indices: &HashMap<ColId, usize>, col_id: ColId) -> usize {
        match indices.get(&col_id) {
            Some(value) => *value,
            // Set out of range so that tokens.get() produces None
            None => usize::MAX,
        }
    }

    // Parses a data line using the header indices
    fn parse_line(
        &mut self,
        line: &str,
        indices: &HashMap<ColId, usize>,
        file: &str,
        line_num: usize,
    ) -> Result<Option<CelestialBody>> {
        let tokens: Vec<&str> = self.split_fields(line);
        let needed = indices.values().max().map_or(0, |m| m + 1);
        if tokens.len() < needed {
            return Err(Error::malformed(
                file,
                line_num,
                format!("expected {} fields, found {}", needed, tokens.len()),
            ));
        }
        let number = |col_id: ColId| -> Result<Option<f64>> {
            parse::parse_opt_f64(tokens.get(Self::get_index(indices, col_id))).map_err(|token| {
                Error::malformed(file, line_num, format!("bad {} value '{}'", col_id.to_str(), token))
            })
        };
        let ra = number(ColId::ra)?;
        let dec = number(ColId::dec)?;
        let dist = number(ColId::dist)?;
        let mag = number(ColId::mag)?;
        let name_col = match self.kind {
            CatalogKind::Stars => ColId::id,
            CatalogKind::Exoplanets => ColId::name,
        };
        let name = parse::parse_opt_str(tokens.get(Self::get_index(indices, name_col)));

        Ok(self.create_body(name, ra, dec, dist, mag))
    }

    /**
     * Validates one record. Returns None for rows that are
     * skipped: missing or non-positive distance, missing
     * fields, coordinates out of range.
     **/
    fn create_body(
        &mut self,
        name: Option<String>,
        ra: Option<f64>,
        dec: Option<f64>,
        dist: Option<f64>,
        mag: Option<f64>,
    ) -> Option<CelestialBody> {
        self.total_processed += 1;

        let dist = match dist {
            Some(d) if d > 0.0 => d,
            _ => {
                self.rejected_dist += 1;
                return None;
            }
        };
        let (ra, dec) = match (ra, dec) {
            (Some(ra), Some(dec)) => (ra, dec),
            _ => {
                self.rejected_fields += 1;
                return None;
            }
        };
        if !(0.0..=360.0).contains(&ra) || !(-90.0..=90.0).contains(&dec) {
            self.rejected_range += 1;
            return None;
        }
        let id = match (self.kind, name) {
            (_, Some(name)) => name,
            (CatalogKind::Stars, None) => format!("star_{}", self.total_loaded),
            (CatalogKind::Exoplanets, None) => {
                self.rejected_fields += 1;
                return None;
            }
        };
        let mag = match self.kind {
            CatalogKind::Stars => mag,
            CatalogKind::Exoplanets => None,
        };

        self.total_loaded += 1;
        if self.total_loaded % 100000 == 0 {
            log::debug!("   object {}", self.total_loaded);
        }
        let ra = if ra == 360.0 { 0.0 } else { ra };
        Some(CelestialBody::new(&id, ra, dec, dist, mag))
    }

    /**
     * The exoplanet archive lists one row per parameter set, so a
     * planet may appear several times. The later row wins and
     * keeps the position of the first.
     **/
    fn dedup_names(&mut self, list: Vec<CelestialBody>) -> Vec<CelestialBody> {
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut out: Vec<CelestialBody> = Vec::with_capacity(list.len());
        for body in list {
            match index.get(&body.id) {
                Some(&i) => {
                    out[i] = body;
                    self.duplicates += 1;
                }
                None => {
                    index.insert(body.id.clone(), out.len());
                    out.push(body);
                }
            }
        }
        out
    }

    fn log_file(&self, loaded: usize, total: usize, file: &str, file_num: usize, file_count: usize) {
        log::info!(
            "{}/{} ({:.3}%): {} -> {}/{} records ({} skipped)",
            file_num,
            file_count,
            100.0 * file_num as f32 / file_count.max(1) as f32,
            Path::new(file)
                .file_name()
                .map_or(file.to_string(), |n| n.to_string_lossy().to_string()),
            loaded,
            total,
            total - loaded
        );
    }

    pub fn report_rejected(&self) {
        log::info!(
            "::: {:?} PROCESSED/LOADED: {}/{}",
            self.kind,
            self.total_processed,
            self.total_loaded
        );
        log::info!("   - Rejected due to distance (missing/non-positive): {}", self.rejected_dist);
        log::info!("   - Rejected due to missing fields: {}", self.rejected_fields);
        log::info!("   - Rejected due to coordinates out of range: {}", self.rejected_range);
        if self.kind == CatalogKind::Exoplanets {
            log::info!("   - Duplicate names replaced: {}", self.duplicates);
        }
    }
}

fn is_catalog_file(file: &str) -> bool {
    file.ends_with(".gz")
        || file.ends_with(".gzip")
        || file.ends_with(".csv")
        || file.ends_with(".txt")
        || file.ends_with(".json")
}
