use std::fs::File;
use std::io::{self, prelude::*, BufReader, Error, ErrorKind};

use crate::base::*;

const PARAMETER_NAMES: [&str; 4] = ["reps", "popsizes", "migrates", "genss"];

impl Parse<SweepParameters> for FileParams {
    // Four data lines in fixed order: replicates, population sizes, migration rates and generations of drift
    fn lparse(&self) -> io::Result<Box<SweepParameters>> {
        let file = match File::open(&self.filename) {
            Ok(x) => x,
            Err(_) => return Err(Error::new(ErrorKind::Other, "The parameter file: ".to_owned() + &self.filename + " does not exist. Please make sure you are entering the correct filename and/or the correct path.")),
        };
        let reader = BufReader::new(file);
        let mut values: Vec<Vec<f64>> = vec![];
        for l in reader.lines() {
            let line = l?;
            // Ignore commented-out and empty lines
            if line.trim_start().starts_with(COMMENT_MARKER) {
                continue;
            }
            let line = strip_comment(&line);
            if line.is_empty() {
                continue;
            }
            if values.len() == PARAMETER_NAMES.len() {
                return Err(Error::new(
                    ErrorKind::Other,
                    "Too many data lines in the parameter file: ".to_owned() + &self.filename + ". Expected one line each for: " + &PARAMETER_NAMES.join(", ") + ".",
                ));
            }
            values.push(parse_f64_tokens(line, &self.filename)?);
        }
        if values.len() < PARAMETER_NAMES.len() {
            return Err(Error::new(
                ErrorKind::Other,
                "Missing '".to_owned() + PARAMETER_NAMES[values.len()] + "' line in the parameter file: " + &self.filename + ".",
            ));
        }
        let reps = f64_to_count(values[0][0], "number of replicates")?;
        let popsizes = values[1]
            .iter()
            .map(|&x| f64_to_count(x, "population size"))
            .collect::<io::Result<Vec<usize>>>()?;
        let migrates = values[2].clone();
        if let Some(m) = migrates.iter().find(|&&m| !(0.0..=1.0).contains(&m)) {
            return Err(Error::new(
                ErrorKind::Other,
                "Migration rates are probabilities and must lie within [0, 1], got: ".to_owned() + &m.to_string() + ".",
            ));
        }
        let genss = values[3]
            .iter()
            .map(|&x| f64_to_count(x, "generation count"))
            .collect::<io::Result<Vec<usize>>>()?;
        Ok(Box::new(SweepParameters {
            reps,
            popsizes,
            migrates,
            genss,
        }))
    }
}

impl SweepParameters {
    pub fn n_combinations(&self) -> usize {
        self.reps * self.popsizes.len() * self.migrates.len() * self.genss.len()
    }

    /// Cartesian product of replicates x population sizes x migration rates x generations,
    /// replicates outermost and generations innermost
    pub fn scenarios(&self) -> Vec<Scenario> {
        let mut out: Vec<Scenario> = Vec::with_capacity(self.n_combinations());
        for rep in 0..self.reps {
            for (popsize_idx, &popsize) in self.popsizes.iter().enumerate() {
                for (migrate_idx, &migration_rate) in self.migrates.iter().enumerate() {
                    for (gens_idx, &generations) in self.genss.iter().enumerate() {
                        out.push(Scenario {
                            key: SweepKey {
                                rep,
                                popsize_idx,
                                migrate_idx,
                                gens_idx,
                            },
                            index: out.len(),
                            rep,
                            popsize,
                            migration_rate,
                            generations,
                        });
                    }
                }
            }
        }
        out
    }
}
