// 📝 Announcement Templates - pure (label, description, link) → status text

use crate::resolver::ResolvedEntity;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template {
    Shrug,
    Whoops,
    Rip,
    MortalCoil,
    Perished,
    BereftOfLife,
    KickedTheBucket,
    PushingUpDaisies,
    ChoirInvisible,
    PiningForTheFjords,
    DeadAsADodo,
    BitTheDust,
    SkullAndCrossbones,
    Skulls,
    DearlyDeparted,
}

impl Template {
    pub const ALL: [Template; 15] = [
        Template::Shrug,
        Template::Whoops,
        Template::Rip,
        Template::MortalCoil,
        Template::Perished,
        Template::BereftOfLife,
        Template::KickedTheBucket,
        Template::PushingUpDaisies,
        Template::ChoirInvisible,
        Template::PiningForTheFjords,
        Template::DeadAsADodo,
        Template::BitTheDust,
        Template::SkullAndCrossbones,
        Template::Skulls,
        Template::DearlyDeparted,
    ];

    pub fn render(&self, entity: &ResolvedEntity) -> String {
        let label = &entity.label;
        let desc = &entity.description;
        let link = &entity.canonical_link;

        match self {
            Template::Shrug => format!("¯\\_(ツ)_/¯ {label} -{desc}- has left us. {link}"),
            Template::Whoops => format!("Whoops! {label} -{desc}- is dead. {link}"),
            Template::Rip => format!("RIP {label}, {desc}. {link}"),
            Template::MortalCoil => {
                format!("{label}, {desc}, has shuffled off this mortal coil. {link}")
            }
            Template::Perished => format!("{label}, {desc}, has passed on, perished, expired. {link}"),
            Template::BereftOfLife => {
                format!("Bereft of life, {label}, {desc}, now rests in peace. {link}")
            }
            Template::KickedTheBucket => format!("{label}, {desc} has kicked the bucket. {link}"),
            Template::PushingUpDaisies => {
                format!("Oh dear, {label}, {desc}, is pushing up daisies. {link}")
            }
            Template::ChoirInvisible => format!("{label}, {desc}, has joined the choir invisible. {link}"),
            Template::PiningForTheFjords => {
                format!("{label}, {desc}, is probably not pining for the fjords. {link}")
            }
            Template::DeadAsADodo => {
                format!("{label}, {desc}, is dead as a dodo, doorknob, or stump. {link}")
            }
            Template::BitTheDust => format!("The dust has been bitten by {label}, {desc}. {link}"),
            Template::SkullAndCrossbones => format!("☠ {label} ☠ {desc} ☠ {link} ☠"),
            Template::Skulls => format!("💀 {label} 💀 {desc} 💀 {link} 💀"),
            Template::DearlyDeparted => {
                format!("Dearly departed, {label}, {desc}, now defunct. {link}")
            }
        }
    }
}

// ============================================================================
// TEMPLATE PICKER
// ============================================================================

/// Chooses a template per announcement. Seeded or fixed pickers make the
/// choice reproducible.
#[derive(Debug)]
pub enum TemplatePicker {
    Random(StdRng),
    Fixed(Template),
}

impl TemplatePicker {
    pub fn from_entropy() -> Self {
        TemplatePicker::Random(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        TemplatePicker::Random(StdRng::seed_from_u64(seed))
    }

    /// Always the template at `index` (wrapping)
    pub fn fixed(index: usize) -> Self {
        TemplatePicker::Fixed(Template::ALL[index % Template::ALL.len()])
    }

    pub fn pick(&mut self) -> Template {
        match self {
            TemplatePicker::Random(rng) => Template::ALL[rng.gen_range(0..Template::ALL.len())],
            TemplatePicker::Fixed(template) => *template,
        }
    }

    pub fn compose(&mut self, entity: &ResolvedEntity) -> String {
        self.pick().render(entity)
    }
}

impl Default for TemplatePicker {
    fn default() -> Self {
        Self::from_entropy()
    }
}
