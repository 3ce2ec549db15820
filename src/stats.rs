use std::fmt;
use std::ops::AddAssign;

/// Counters reported at the foot of every report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub sites_searched: u32,
    pub sites_with_results: u32,
    pub results_found: u32,
}

impl RunStats {
    /// Contribution of one searched city that produced `results` entries.
    pub fn for_site(results: u32) -> Self {
        Self {
            sites_searched: 1,
            sites_with_results: u32::from(results > 0),
            results_found: results,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn merge(&mut self, other: RunStats) {
        self.sites_searched += other.sites_searched;
        self.sites_with_results += other.sites_with_results;
        self.results_found += other.results_found;
    }

    /// `<h3>` block written between the body and the tail of a report.
    pub fn fragment(&self) -> String {
        format!("<h3>{}</h3>\n", self)
    }
}

impl AddAssign for RunStats {
    fn add_assign(&mut self, rhs: Self) {
        self.merge(rhs);
    }
}

impl fmt::Display for RunStats {
    // "seached" matches reports produced by earlier runs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Sites seached: {} | Sites with results: {} | Results found: {}",
            self.sites_searched, self.sites_with_results, self.results_found
        )
    }
}
