use crate::models::{DetailLevel, Language};

pub const LOW_ES: &str = include_str!("../data/prompts/low_es.txt");
pub const LOW_EN: &str = include_str!("../data/prompts/low_en.txt");
pub const LOW_FR: &str = include_str!("../data/prompts/low_fr.txt");
pub const AUTO_ES: &str = include_str!("../data/prompts/auto_es.txt");
pub const AUTO_EN: &str = include_str!("../data/prompts/auto_en.txt");
pub const AUTO_FR: &str = include_str!("../data/prompts/auto_fr.txt");
pub const HIGH_ES: &str = include_str!("../data/prompts/high_es.txt");
pub const HIGH_EN: &str = include_str!("../data/prompts/high_en.txt");
pub const HIGH_FR: &str = include_str!("../data/prompts/high_fr.txt");

/// Instruction text sent alongside the image for a detail/language pair.
pub fn instruction(detail: DetailLevel, language: Language) -> &'static str {
    let template = match (detail, language) {
        (DetailLevel::Low, Language::Es) => LOW_ES,
        (DetailLevel::Low, Language::En) => LOW_EN,
        (DetailLevel::Low, Language::Fr) => LOW_FR,
        (DetailLevel::Auto, Language::Es) => AUTO_ES,
        (DetailLevel::Auto, Language::En) => AUTO_EN,
        (DetailLevel::Auto, Language::Fr) => AUTO_FR,
        (DetailLevel::High, Language::Es) => HIGH_ES,
        (DetailLevel::High, Language::En) => HIGH_EN,
        (DetailLevel::High, Language::Fr) => HIGH_FR,
    };
    template.trim_end()
}
