//! End-of-round observation: per-strategy tally, resolution reset, and the
//! tab-separated record stream.

use crate::population::PopulationManager;
use crate::strategy::{Strategy, StrategyCounts};
use std::io::{self, Write};

/// Aggregate for one completed round
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RoundRecord {
    /// Zero-based round index
    pub round: u64,
    /// Live agents per strategy at the end of the round
    pub counts: StrategyCounts,
    /// No agents remain
    pub extinct: bool,
}

impl RoundRecord {
    /// Total live population
    pub fn population(&self) -> usize {
        self.counts.total()
    }

    /// Tab-separated data line: round index then the ten counts
    pub fn to_line(&self) -> String {
        let mut line = self.round.to_string();
        for (_, count) in self.counts.iter() {
            line.push('\t');
            line.push_str(&count.to_string());
        }
        line
    }
}

/// Tab-separated header naming every column
pub fn header_line() -> String {
    let mut line = String::from("step");
    for strategy in Strategy::ALL {
        line.push('\t');
        line.push_str(strategy.column());
    }
    line
}

/// Count live agents by strategy and clear every agent's resolved flag
pub fn observe(population: &mut PopulationManager, round: u64) -> RoundRecord {
    let mut counts = StrategyCounts::new();
    for agent in population.iter_mut() {
        *counts.get_mut(agent.strategy) += 1;
        agent.resolved = false;
    }
    RoundRecord {
        round,
        counts,
        extinct: population.is_empty(),
    }
}

/// Destination for the per-round record stream
pub trait StatsSink {
    /// Called once before the first record
    fn write_header(&mut self) -> io::Result<()>;

    fn write_record(&mut self, record: &RoundRecord) -> io::Result<()>;

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Writes the header and records as tab-separated lines
pub struct TsvSink<W: Write> {
    writer: W,
}

impl<W: Write> TsvSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> StatsSink for TsvSink<W> {
    fn write_header(&mut self) -> io::Result<()> {
        writeln!(self.writer, "{}", header_line())
    }

    fn write_record(&mut self, record: &RoundRecord) -> io::Result<()> {
        writeln!(self.writer, "{}", record.to_line())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Keeps records in memory
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    pub header_written: bool,
    pub records: Vec<RoundRecord>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Population per round as (round, total)
    pub fn population_series(&self) -> Vec<(u64, usize)> {
        self.records.iter().map(|r| (r.round, r.population())).collect()
    }
}

impl StatsSink for MemorySink {
    fn write_header(&mut self) -> io::Result<()> {
        self.header_written = true;
        Ok(())
    }

    fn write_record(&mut self, record: &RoundRecord) -> io::Result<()> {
        self.records.push(record.clone());
        Ok(())
    }
}

impl<S: StatsSink + ?Sized> StatsSink for &mut S {
    fn write_header(&mut self) -> io::Result<()> {
        (**self).write_header()
    }

    fn write_record(&mut self, record: &RoundRecord) -> io::Result<()> {
        (**self).write_record(record)
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReproductionConfig;
    use crate::grid::SpatialGrid;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_header() {
        assert_eq!(
            header_line(),
            "step\tnNaiveC\tnNaiveD\tnWalkawayC\tnWalkawayD\tnTFTStationary\tnTFTMobile\tnPAVLOVStationary\tnPAVLOVMobile\tnRealisticTFT\tnRetreat"
        );
    }

    #[test]
    fn test_observe_counts_and_resets() {
        let mut pop = PopulationManager::new(10, ReproductionConfig::default());
        let mut grid = SpatialGrid::new(10, 10);
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut counts = StrategyCounts::new();
        counts.set(Strategy::NaiveD, 2);
        counts.set(Strategy::Retreat, 1);
        pop.seed(&counts, &mut grid, &mut rng);
        for agent in pop.iter_mut() {
            agent.resolved = true;
        }

        let record = observe(&mut pop, 4);
        assert_eq!(record.round, 4);
        assert_eq!(record.counts, counts);
        assert!(!record.extinct);
        assert!(pop.iter().all(|a| !a.resolved));
        assert_eq!(record.to_line(), "4\t0\t2\t0\t0\t0\t0\t0\t0\t0\t1");
    }

    #[test]
    fn test_observe_extinct() {
        let mut pop = PopulationManager::new(0, ReproductionConfig::default());
        let record = observe(&mut pop, 0);
        assert!(record.extinct);
        assert_eq!(record.to_line(), "0\t0\t0\t0\t0\t0\t0\t0\t0\t0\t0");
    }

    #[test]
    fn test_tsv_sink() {
        let mut sink = TsvSink::new(Vec::new());
        sink.write_header().unwrap();
        sink.write_record(&RoundRecord::default()).unwrap();
        let text = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("step\t"));
        assert_eq!(lines[1].split('\t').count(), 11);
    }
}
