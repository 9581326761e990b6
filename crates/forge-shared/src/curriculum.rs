//! Content registry for the kids course (v0.4.0).
//!
//! Static catalog: units -> lessons, the level threshold table and the daily
//! task templates. Pure data plus lookups in curriculum order.

use crate::error::CurriculumError;
use crate::progress::TaskType;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Text in both supported UI languages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedText {
    pub zh: String,
    pub ja: String,
}

impl LocalizedText {
    pub fn new(zh: &str, ja: &str) -> Self {
        Self {
            zh: zh.to_string(),
            ja: ja.to_string(),
        }
    }
}

/// How a lesson is delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LessonKind {
    Video,
    Interactive,
    Project,
    Quiz,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: String,
    pub unit_id: String,
    /// 1-based position inside the unit
    pub order: u32,
    pub title: LocalizedText,
    pub kind: LessonKind,
    pub duration_mins: u32,
    pub stars_reward: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub id: String,
    pub title: LocalizedText,
    /// Badge awarded when every lesson of the unit is completed
    pub badge_id: String,
    pub lessons: Vec<Lesson>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelConfig {
    pub level: u32,
    pub title: LocalizedText,
    pub required_stars: u32,
    pub reward: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTaskTemplate {
    pub id: String,
    pub task_type: TaskType,
    pub title: LocalizedText,
    pub target: u32,
    pub stars: u32,
}

/// The whole catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Curriculum {
    pub units: Vec<Unit>,
    pub levels: Vec<LevelConfig>,
    pub daily_templates: Vec<DailyTaskTemplate>,
}

// ============================================================================
// Built-in kids course
// ============================================================================

/// (level, zh, ja, required stars, reward)
const KIDS_LEVELS: &[(u32, &str, &str, u32, &str)] = &[
    (1, "AI小萌新", "AI初心者", 0, "avatar-frame-1"),
    (2, "AI小学徒", "AI見習い", 50, "avatar-frame-2"),
    (3, "AI小助手", "AIアシスタント", 150, "special-animation"),
    (4, "AI小专家", "AI専門家", 300, "advanced-course"),
    (5, "AI小博士", "AI博士", 500, "certificate"),
];

/// (unit id, zh, ja)
const KIDS_UNITS: &[(&str, &str, &str)] = &[
    ("unit-1", "认识AI朋友", "AIの友達を知ろう"),
    ("unit-2", "Python小魔法师", "Python小さな魔法使い"),
    ("unit-3", "AI画画和认图", "AIで絵を描いて認識しよう"),
    ("unit-4", "和AI聊天", "AIとおしゃべり"),
];

/// (unit index, zh, ja, kind, minutes, stars) in curriculum order
const KIDS_LESSONS: &[(usize, &str, &str, LessonKind, u32, u32)] = &[
    (0, "什么是人工智能？", "人工知能って何？", LessonKind::Video, 30, 15),
    (0, "AI能做什么？", "AIは何ができる？", LessonKind::Interactive, 15, 10),
    (0, "聪明的机器人", "賢いロボット", LessonKind::Video, 15, 10),
    (0, "教机器认图片", "機械に画像を教えよう", LessonKind::Interactive, 15, 10),
    (0, "教机器听声音", "機械に音を教えよう", LessonKind::Interactive, 15, 10),
    (0, "单元小测验", "ユニットテスト", LessonKind::Quiz, 15, 15),
    (1, "认识Python", "Pythonを知ろう", LessonKind::Video, 15, 10),
    (1, "让电脑说话 (print)", "電脑に話させよう (print)", LessonKind::Interactive, 15, 10),
    (1, "给电脑取名字 (变量)", "変数に名前をつけよう", LessonKind::Interactive, 15, 10),
    (1, "加减乘除小计算", "足し算引き算かけ算割り算", LessonKind::Interactive, 15, 10),
    (1, "做个小程序", "小さなプログラムを作ろう", LessonKind::Project, 15, 15),
    (1, "单元小测验", "ユニットテスト", LessonKind::Quiz, 15, 15),
    (2, "AI怎么看图片", "AIはどうやって画像を見る？", LessonKind::Video, 15, 10),
    (2, "教AI认猫狗", "AIに猫と犬を教えよう", LessonKind::Interactive, 15, 10),
    (2, "AI画家", "AI画家", LessonKind::Video, 15, 10),
    (2, "动手：图片分类器", "実践：画像分類器", LessonKind::Project, 15, 15),
    (2, "动手：AI涂鸦", "実践：AIお絵かき", LessonKind::Project, 15, 15),
    (2, "单元小测验", "ユニットテスト", LessonKind::Quiz, 15, 15),
    (3, "聊天机器人原理", "チャットボットの仕組み", LessonKind::Video, 15, 10),
    (3, "教AI说话", "AIに話を教えよう", LessonKind::Interactive, 15, 10),
    (3, "问答小助手", "質問応答アシスタント", LessonKind::Interactive, 15, 10),
    (3, "动手：我的聊天伙伴", "実践：私のチャット仲間", LessonKind::Project, 15, 15),
    (3, "AI的未来", "AIの未来", LessonKind::Video, 15, 10),
    (3, "毕业典礼", "卒業式", LessonKind::Quiz, 15, 20),
];

/// (id, type, zh, ja, target, stars)
const KIDS_DAILY_TASKS: &[(&str, TaskType, &str, &str, u32, u32)] = &[
    ("learn-lesson", TaskType::Lesson, "今日学习 1 课", "今日1レッスン学ぶ", 1, 10),
    ("complete-exercises", TaskType::Exercise, "完成 3 道练习", "3問の練習を完了", 3, 5),
    ("review-old", TaskType::Review, "复习旧知识", "復習する", 1, 5),
    ("challenge-quiz", TaskType::Quiz, "挑战小测验", "テストに挑戦", 1, 15),
];

impl Curriculum {
    /// The built-in four-unit kids course
    pub fn kids_course() -> Self {
        let mut units: Vec<Unit> = KIDS_UNITS
            .iter()
            .enumerate()
            .map(|(i, (id, zh, ja))| Unit {
                id: id.to_string(),
                title: LocalizedText::new(zh, ja),
                badge_id: format!("unit-{}-complete", i + 1),
                lessons: Vec::new(),
            })
            .collect();

        for (n, (unit_idx, zh, ja, kind, mins, stars)) in KIDS_LESSONS.iter().enumerate() {
            let unit = &mut units[*unit_idx];
            let order = unit.lessons.len() as u32 + 1;
            unit.lessons.push(Lesson {
                id: format!("lesson-{}", n + 1),
                unit_id: unit.id.clone(),
                order,
                title: LocalizedText::new(zh, ja),
                kind: *kind,
                duration_mins: *mins,
                stars_reward: *stars,
            });
        }

        let levels = KIDS_LEVELS
            .iter()
            .map(|(level, zh, ja, required, reward)| LevelConfig {
                level: *level,
                title: LocalizedText::new(zh, ja),
                required_stars: *required,
                reward: reward.to_string(),
            })
            .collect();

        let daily_templates = KIDS_DAILY_TASKS
            .iter()
            .map(|(id, task_type, zh, ja, target, stars)| DailyTaskTemplate {
                id: id.to_string(),
                task_type: *task_type,
                title: LocalizedText::new(zh, ja),
                target: *target,
                stars: *stars,
            })
            .collect();

        Self {
            units,
            levels,
            daily_templates,
        }
    }

    /// Check structural invariants the progress store relies on
    pub fn validate(&self) -> Result<(), CurriculumError> {
        if self.units.is_empty() || self.units.iter().all(|u| u.lessons.is_empty()) {
            return Err(CurriculumError::Empty);
        }

        let mut seen = HashSet::new();
        for lesson in self.all_lessons() {
            if !seen.insert(lesson.id.as_str()) {
                return Err(CurriculumError::DuplicateLesson(lesson.id.clone()));
            }
        }

        match self.levels.first() {
            Some(first) if first.level == 1 && first.required_stars == 0 => {}
            _ => {
                return Err(CurriculumError::LevelTable(
                    "table must start at level 1 with 0 stars".to_string(),
                ))
            }
        }
        for pair in self.levels.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            if next.level != prev.level + 1 || next.required_stars <= prev.required_stars {
                return Err(CurriculumError::LevelTable(format!(
                    "level {} does not follow level {}",
                    next.level, prev.level
                )));
            }
        }

        Ok(())
    }

    /// Every lesson in curriculum order
    pub fn all_lessons(&self) -> impl Iterator<Item = &Lesson> {
        self.units.iter().flat_map(|u| u.lessons.iter())
    }

    pub fn total_lessons(&self) -> usize {
        self.units.iter().map(|u| u.lessons.len()).sum()
    }

    pub fn first_lesson(&self) -> Option<&Lesson> {
        self.all_lessons().next()
    }

    pub fn lesson(&self, lesson_id: &str) -> Option<&Lesson> {
        self.all_lessons().find(|l| l.id == lesson_id)
    }

    pub fn unit(&self, unit_id: &str) -> Option<&Unit> {
        self.units.iter().find(|u| u.id == unit_id)
    }

    pub fn unit_of(&self, lesson_id: &str) -> Option<&Unit> {
        self.units
            .iter()
            .find(|u| u.lessons.iter().any(|l| l.id == lesson_id))
    }

    fn position(&self, lesson_id: &str) -> Option<usize> {
        self.all_lessons().position(|l| l.id == lesson_id)
    }

    pub fn next_lesson(&self, lesson_id: &str) -> Option<&Lesson> {
        let idx = self.position(lesson_id)?;
        self.all_lessons().nth(idx + 1)
    }

    pub fn previous_lesson(&self, lesson_id: &str) -> Option<&Lesson> {
        let idx = self.position(lesson_id)?;
        if idx == 0 {
            return None;
        }
        self.all_lessons().nth(idx - 1)
    }

    pub fn level_config(&self, level: u32) -> Option<&LevelConfig> {
        self.levels.iter().find(|l| l.level == level)
    }
}

impl Default for Curriculum {
    fn default() -> Self {
        Self::kids_course()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kids_course_shape() {
        let c = Curriculum::kids_course();
        assert_eq!(c.units.len(), 4);
        assert!(c.units.iter().all(|u| u.lessons.len() == 6));
        assert_eq!(c.total_lessons(), 24);
        assert_eq!(c.first_lesson().unwrap().id, "lesson-1");
        assert_eq!(c.units[2].badge_id, "unit-3-complete");
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_next_lesson_crosses_units() {
        let c = Curriculum::kids_course();
        let next = c.next_lesson("lesson-6").unwrap();
        assert_eq!(next.id, "lesson-7");
        assert_eq!(next.unit_id, "unit-2");
        assert_eq!(next.order, 1);
        assert!(c.next_lesson("lesson-24").is_none());
        assert!(c.next_lesson("no-such-lesson").is_none());
    }

    #[test]
    fn test_previous_lesson() {
        let c = Curriculum::kids_course();
        assert!(c.previous_lesson("lesson-1").is_none());
        assert_eq!(c.previous_lesson("lesson-13").unwrap().id, "lesson-12");
    }

    #[test]
    fn test_unit_of() {
        let c = Curriculum::kids_course();
        assert_eq!(c.unit_of("lesson-19").unwrap().id, "unit-4");
        assert!(c.unit_of("lesson-99").is_none());
    }

    #[test]
    fn test_validate_rejects_duplicates() {
        let mut c = Curriculum::kids_course();
        let dup = c.units[0].lessons[0].clone();
        c.units[1].lessons.push(dup);
        assert!(matches!(
            c.validate(),
            Err(CurriculumError::DuplicateLesson(id)) if id == "lesson-1"
        ));
    }

    #[test]
    fn test_validate_rejects_bad_level_table() {
        let mut c = Curriculum::kids_course();
        c.levels[2].required_stars = 10;
        assert!(matches!(c.validate(), Err(CurriculumError::LevelTable(_))));

        let mut c = Curriculum::kids_course();
        c.levels.clear();
        assert!(c.validate().is_err());
    }
}
