use ahash::AHashMap;

/// Raw station name bytes, used verbatim as the aggregation key.
pub type StationKey = Vec<u8>;

/// Running statistics for one station, with every value held in tenths.
/// `sum` is widened so it cannot overflow for any count of bounded measurements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StationStats {
    pub min: i64,
    pub max: i64,
    pub sum: i128,
    pub count: u64,
}

impl StationStats {
    pub fn new(measurement: i64) -> Self {
        Self {
            min: measurement,
            max: measurement,
            sum: i128::from(measurement),
            count: 1,
        }
    }

    pub fn record(&mut self, measurement: i64) {
        self.min = self.min.min(measurement);
        self.max = self.max.max(measurement);
        self.sum += i128::from(measurement);
        self.count += 1;
    }

    /// Combine two sets of statistics. Commutative and associative, so partial
    /// results can be folded in any order or grouping.
    pub fn combine(self, other: StationStats) -> StationStats {
        StationStats {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
            sum: self.sum + other.sum,
            count: self.count + other.count,
        }
    }

    pub fn merge(&mut self, other: &StationStats) {
        *self = self.combine(*other);
    }

    pub fn min_value(&self) -> f64 {
        self.min as f64 / 10.0
    }

    pub fn max_value(&self) -> f64 {
        self.max as f64 / 10.0
    }

    pub fn mean_value(&self) -> f64 {
        self.sum as f64 / self.count as f64 / 10.0
    }

    /// Mean in tenths, rounded up towards positive infinity, in exact integer
    /// arithmetic.
    pub fn mean_tenths_ceil(&self) -> i128 {
        let count = i128::from(self.count);
        -(-self.sum).div_euclid(count)
    }
}

/// Station key to statistics mapping. Used both for the partial result of a
/// single chunk and for the merged result of the whole file.
#[derive(Debug, Clone, Default)]
pub struct StationTable {
    stations: AHashMap<StationKey, StationStats>,
}

pub type PartialResult = StationTable;
pub type GlobalResult = StationTable;

impl StationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            stations: AHashMap::with_capacity(capacity),
        }
    }

    /// Add one measurement (in tenths) for `key`. The key is only copied the
    /// first time it is seen.
    pub fn record(&mut self, key: &[u8], measurement: i64) {
        match self.stations.get_mut(key) {
            Some(stats) => stats.record(measurement),
            None => {
                self.stations
                    .insert(key.to_vec(), StationStats::new(measurement));
            }
        }
    }

    pub fn merge_entry(&mut self, key: StationKey, stats: StationStats) {
        self.stations
            .entry(key)
            .and_modify(|existing| existing.merge(&stats))
            .or_insert(stats);
    }

    /// Fold another table into this one, consuming it.
    pub fn absorb(&mut self, other: StationTable) {
        if self.stations.is_empty() {
            self.stations = other.stations;
            return;
        }
        for (key, stats) in other.stations {
            self.merge_entry(key, stats);
        }
    }

    pub fn get(&self, key: &[u8]) -> Option<&StationStats> {
        self.stations.get(key)
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &StationStats)> {
        self.stations.iter().map(|(k, v)| (k.as_slice(), v))
    }

    /// Entries ordered by raw key bytes.
    pub fn sorted(&self) -> Vec<(&[u8], &StationStats)> {
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
        entries
    }
}

impl PartialEq for StationTable {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(key, stats)| other.get(key) == Some(stats))
    }
}

impl Eq for StationTable {}
