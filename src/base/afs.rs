use log::warn;
use std::fs::File;
use std::io::{self, prelude::*, BufReader, Error, ErrorKind};

use crate::base::*;

impl Parse<AlleleFrequencySpectrum> for FileAfs {
    // One locus per line: number of alleles followed by the frequency of each allele
    fn lparse(&self) -> io::Result<Box<AlleleFrequencySpectrum>> {
        let file = match File::open(&self.filename) {
            Ok(x) => x,
            Err(_) => return Err(Error::new(ErrorKind::Other, "The allele frequency file: ".to_owned() + &self.filename + " does not exist. Please make sure you are entering the correct filename and/or the correct path.")),
        };
        let reader = BufReader::new(file);
        let mut frequencies: Vec<Vec<f64>> = vec![];
        for l in reader.lines() {
            let line = l?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let locus = frequencies.len();
            let vec_line = parse_f64_tokens(line, &self.filename)?;
            // The leading allele count is informational only
            let freqs = vec_line[1..].to_vec();
            if freqs.is_empty() {
                return Err(Error::new(
                    ErrorKind::Other,
                    "Locus ".to_owned() + &locus.to_string() + " has no allele frequencies in file: " + &self.filename + ".",
                ));
            }
            if freqs.iter().any(|&x| !(x >= 0.0)) {
                return Err(Error::new(
                    ErrorKind::Other,
                    "Locus ".to_owned() + &locus.to_string() + " has a negative or invalid allele frequency in file: " + &self.filename + ".",
                ));
            }
            if vec_line[0] != freqs.len() as f64 {
                warn!(
                    "Locus {} declares {} alleles but lists {} frequencies.",
                    locus,
                    vec_line[0],
                    freqs.len()
                );
            }
            let s: f64 = freqs.iter().sum();
            if (s - 1.0).abs() > 1e-6 {
                warn!("Allele frequencies of locus {} sum up to {} instead of 1.", locus, s);
            }
            frequencies.push(freqs);
        }
        if frequencies.is_empty() {
            return Err(Error::new(
                ErrorKind::Other,
                "No loci found in the allele frequency file: ".to_owned() + &self.filename + ".",
            ));
        }
        Ok(Box::new(AlleleFrequencySpectrum { frequencies }))
    }
}

impl AlleleFrequencySpectrum {
    pub fn n_loci(&self) -> usize {
        self.frequencies.len()
    }

    pub fn n_alleles(&self, locus: usize) -> usize {
        self.frequencies[locus].len()
    }
}
