//! The warrior skill tree

use dg_core::data::{SkillEffect, SkillNode, SkillRequirement};

pub fn skills() -> Vec<SkillNode> {
    vec![
        SkillNode {
            id: "power_strike".to_string(),
            name: "Power Strike".to_string(),
            effect: SkillEffect::PowerStrike,
            class_id: Some("warrior".to_string()),
            max_rank: 5,
            required_level: 1,
            requires: None,
            mana_cost: 8,
            cooldown: 3.0,
            base_value: 1.8,
            range: 3.0,
        },
        SkillNode {
            id: "whirlwind".to_string(),
            name: "Whirlwind".to_string(),
            effect: SkillEffect::Whirlwind,
            class_id: Some("warrior".to_string()),
            max_rank: 5,
            required_level: 3,
            requires: Some(SkillRequirement {
                skill: "power_strike".to_string(),
                points: 1,
            }),
            mana_cost: 15,
            cooldown: 6.0,
            base_value: 1.2,
            range: 4.0,
        },
        SkillNode {
            id: "charge".to_string(),
            name: "Charge".to_string(),
            effect: SkillEffect::Charge,
            class_id: Some("warrior".to_string()),
            max_rank: 3,
            required_level: 5,
            requires: Some(SkillRequirement {
                skill: "power_strike".to_string(),
                points: 2,
            }),
            mana_cost: 12,
            cooldown: 10.0,
            base_value: 1.5,
            range: 5.0,
        },
    ]
}
