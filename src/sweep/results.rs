use std::fs::OpenOptions;
use std::io::{self, prelude::*, BufWriter, Error, ErrorKind};

use crate::base::*;

pub const RESULTS_HEADER: &str = "Rep\tPopsize\tMigRate\tGensDrift\tFst\tChi2Pval\tPropTestsDropped";
pub const NAN_SENTINEL: &str = "NA";

impl ResultsStore {
    pub fn new() -> Self {
        ResultsStore::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn get(&self, key: &SweepKey) -> Option<&SweepRecord> {
        self.index.get(key).map(|&i| &self.records[i])
    }

    // Each combination is recorded exactly once
    pub fn insert(&mut self, record: SweepRecord) -> io::Result<&SweepRecord> {
        let key = record.scenario.key;
        if self.index.contains_key(&key) {
            return Err(Error::new(
                ErrorKind::Other,
                format!("Results for {:?} were already recorded.", key),
            ));
        }
        self.index.insert(key, self.records.len());
        self.records.push(record);
        Ok(&self.records[self.records.len() - 1])
    }

    /// Check that every combination of the sweep has been recorded
    pub fn check_complete(&self, params: &SweepParameters) -> io::Result<()> {
        let missing = params
            .scenarios()
            .into_iter()
            .filter(|x| self.get(&x.key).is_none())
            .count();
        if (missing > 0) || (self.len() != params.n_combinations()) {
            return Err(Error::new(
                ErrorKind::Other,
                format!(
                    "Incomplete results: {} of {} parameter combinations are missing.",
                    missing,
                    params.n_combinations()
                ),
            ));
        }
        Ok(())
    }
}

impl SweepRecord {
    pub fn to_row(&self, nan_policy: NanPolicy) -> String {
        let chi2_pval = if !self.chi2_pval.is_finite() && (nan_policy == NanPolicy::Sentinel) {
            NAN_SENTINEL.to_owned()
        } else {
            self.chi2_pval.to_string()
        };
        vec![
            self.scenario.rep.to_string(),
            self.scenario.popsize.to_string(),
            self.scenario.migration_rate.to_string(),
            self.scenario.generations.to_string(),
            self.fst.to_string(),
            chi2_pval,
            self.prop_dropped.to_string(),
        ]
        .join("\t")
    }
}

impl ResultsFile {
    pub fn new(output_prefix: &str) -> io::Result<Self> {
        let filename = output_prefix.to_owned() + "_globFstChi2_results.txt";
        let error_writing_file = "Unable to create file: ".to_owned() + &filename;
        let file = match OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&filename)
        {
            Ok(x) => x,
            Err(_) => return Err(Error::new(ErrorKind::Other, error_writing_file)),
        };
        let mut out = ResultsFile {
            filename,
            writer: BufWriter::new(file),
            n_rows: 0,
        };
        out.writer.write_all((RESULTS_HEADER.to_owned() + "\n").as_bytes())?;
        out.writer.flush()?;
        Ok(out)
    }

    // Append and flush so that a failure later in the sweep keeps the completed rows
    pub fn append(&mut self, record: &SweepRecord, nan_policy: NanPolicy) -> io::Result<()> {
        let line = record.to_row(nan_policy) + "\n";
        self.writer.write_all(line.as_bytes())?;
        self.writer.flush()?;
        self.n_rows += 1;
        Ok(())
    }
}
