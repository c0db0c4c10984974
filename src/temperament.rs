use crate::tuning::Tuning;

/// How quickly a cat gets hungry, cross and destructive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Temperament {
    Placid,
    Normal,
    Feral,
}

const ALL_TEMPERAMENTS: [Temperament; 3] =
    [Temperament::Placid, Temperament::Normal, Temperament::Feral];

impl Temperament {
    pub fn label(self) -> &'static str {
        match self {
            Temperament::Placid => "placid",
            Temperament::Normal => "normal",
            Temperament::Feral => "feral",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Temperament::Placid => Temperament::Normal,
            Temperament::Normal => Temperament::Feral,
            Temperament::Feral => Temperament::Placid,
        }
    }

    pub fn all() -> &'static [Temperament] {
        &ALL_TEMPERAMENTS
    }

    /// Case-insensitive lookup by label.
    pub fn from_label(label: &str) -> Option<Self> {
        ALL_TEMPERAMENTS
            .iter()
            .copied()
            .find(|t| t.label().eq_ignore_ascii_case(label.trim()))
    }

    /// Overwrite the preset-controlled fields of `tuning`. Thresholds stay
    /// as they are; only rates and chances move.
    pub fn apply(self, tuning: &mut Tuning) {
        let base = Tuning::default();
        match self {
            Temperament::Placid => {
                tuning.hunger_rate = base.hunger_rate * 0.5;
                tuning.mischief_base_chance = 0.02;
                tuning.mischief_chance_growth = 0.05;
                tuning.attack_damage_rate = base.attack_damage_rate * 0.5;
                tuning.wander_chance = base.wander_chance * 0.5;
                tuning.max_speed = base.max_speed * 0.8;
            }
            Temperament::Normal => {
                tuning.hunger_rate = base.hunger_rate;
                tuning.mischief_base_chance = base.mischief_base_chance;
                tuning.mischief_chance_growth = base.mischief_chance_growth;
                tuning.attack_damage_rate = base.attack_damage_rate;
                tuning.wander_chance = base.wander_chance;
                tuning.max_speed = base.max_speed;
            }
            Temperament::Feral => {
                tuning.hunger_rate = base.hunger_rate * 2.0;
                tuning.mischief_base_chance = 0.3;
                tuning.mischief_chance_growth = 0.4;
                tuning.attack_damage_rate = base.attack_damage_rate * 2.0;
                tuning.wander_chance = base.wander_chance * 3.0;
                tuning.max_speed = base.max_speed * 1.4;
            }
        }
    }
}

impl Default for Temperament {
    fn default() -> Self {
        Temperament::Normal
    }
}
