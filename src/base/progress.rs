use std::fs::OpenOptions;
use std::io::{self, prelude::*, BufWriter, Error, ErrorKind};
use std::time::Instant;

use crate::base::*;

impl ProgressLog {
    pub fn new(output_prefix: &str) -> io::Result<Self> {
        let filename = output_prefix.to_owned() + "_log.txt";
        let file = match OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&filename)
        {
            Ok(x) => x,
            Err(_) => {
                return Err(Error::new(
                    ErrorKind::Other,
                    "Unable to create log file: ".to_owned() + &filename,
                ))
            }
        };
        Ok(ProgressLog {
            filename,
            writer: BufWriter::new(file),
            start: Instant::now(),
        })
    }

    // Log file only
    pub fn write(&mut self, line: &str) -> io::Result<()> {
        self.writer.write_all((line.to_owned() + "\n").as_bytes())
    }

    // Log file and standard output
    pub fn echo(&mut self, line: &str) -> io::Result<()> {
        println!("{}", line);
        self.write(line)
    }

    pub fn start_time(&mut self) -> io::Result<()> {
        self.echo(&("startTime ".to_owned() + &timestamp()))
    }

    pub fn parameters(
        &mut self,
        params: &SweepParameters,
        settings: &SweepSettings,
        n_loci: usize,
    ) -> io::Result<()> {
        self.write("\n-----Parameters----")?;
        self.write(&("replicates ".to_owned() + &params.reps.to_string()))?;
        self.write(&("popsizes ".to_owned() + &join_usize(&params.popsizes, " ")))?;
        self.write(&("migrationRates ".to_owned() + &join_f64(&params.migrates, " ")))?;
        self.write(&("generationsDrift ".to_owned() + &join_usize(&params.genss, " ")))?;
        self.write(&("loci ".to_owned() + &n_loci.to_string()))?;
        self.write(&("seed ".to_owned() + &settings.seed.to_string()))?;
        self.write(&("pvalueMode ".to_owned() + &format!("{:?}", settings.pvalue_mode)))?;
        self.write(&("nanPolicy ".to_owned() + &format!("{:?}", settings.nan_policy)))?;
        self.write("\n-----Simulation-----")
    }

    /// Progress marker per sweep level: replicate (0), population size (1), migration rate (2) and generations (3)
    pub fn level(&mut self, depth: usize, label: &str, value: &str) -> io::Result<()> {
        let mut line = " ".repeat(depth) + label + " " + value;
        if depth == 0 {
            line = line + " " + &timestamp();
        }
        self.echo(&line)
    }

    pub fn warn(&mut self, message: &str) -> io::Result<()> {
        self.echo(&("WARNING: ".to_owned() + message))
    }

    pub fn finish(&mut self) -> io::Result<f64> {
        let runtime = self.start.elapsed().as_secs_f64();
        self.echo(&("endTime ".to_owned() + &timestamp()))?;
        self.echo(&("runTime ".to_owned() + &format!("{:.2}", runtime) + " seconds"))?;
        self.writer.flush()?;
        Ok(runtime)
    }
}
