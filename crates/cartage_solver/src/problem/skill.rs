use fxhash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::problem::scale::SkillValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Skill(SkillValue);

impl Skill {
    pub const fn new(value: SkillValue) -> Self {
        Skill(value)
    }

    pub const fn get(&self) -> SkillValue {
        self.0
    }
}

pub type SkillSet = FxHashSet<Skill>;

pub fn skill_set(values: impl IntoIterator<Item = SkillValue>) -> SkillSet {
    values.into_iter().map(Skill::new).collect()
}
