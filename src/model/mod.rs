use derive_new::new;
use serde::{Deserialize, Serialize};

pub use bucket::*;
pub use content::*;
pub use record::*;

mod bucket;
mod content;
mod record;

/// Live view/click pair for one (content, bucket) entry.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct Counter {
    pub view: u64,
    pub click: u64,
}

impl Counter {
    pub fn merge(&mut self, other: Counter) {
        self.view += other.view;
        self.click += other.click;
    }
}
