//! Builder patterns for creating test data programmatically.
//!
//! These builders insert through the repositories and hand back the row
//! as the resolvers would load it.

#![allow(dead_code)]

use apphub::db::{application_repo, archetype_repo, assessment_repo, questionnaire_repo, Database};
use apphub::model::{
    Answer, Application, Archetype, Assessment, AssessmentOwner, CategorizedTag, Question,
    Questionnaire, Risk, Section, Tag, Thresholds,
};

/// Builder for `Questionnaire` rows with one section.
pub struct QuestionnaireBuilder {
    questionnaire: Questionnaire,
}

impl QuestionnaireBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            questionnaire: Questionnaire {
                name: name.to_string(),
                required: true,
                thresholds: Thresholds {
                    red: 50,
                    yellow: 50,
                    unknown: 50,
                },
                sections: vec![Section {
                    order: 1,
                    name: "Main".to_string(),
                    ..Default::default()
                }],
                ..Default::default()
            },
        }
    }

    pub fn required(mut self, required: bool) -> Self {
        self.questionnaire.required = required;
        self
    }

    /// Thresholds in percent.
    pub fn thresholds(mut self, red: u32, yellow: u32, unknown: u32) -> Self {
        self.questionnaire.thresholds = Thresholds { red, yellow, unknown };
        self
    }

    /// Appends a question offering one answer per risk, in order.
    pub fn question(self, text: &str, risks: &[Risk]) -> Self {
        let answers = risks
            .iter()
            .enumerate()
            .map(|(i, risk)| Answer {
                order: i as u32 + 1,
                text: risk.to_string(),
                risk: *risk,
                ..Default::default()
            })
            .collect();
        self.with_question(Question {
            text: text.to_string(),
            answers,
            ..Default::default()
        })
    }

    pub fn with_question(mut self, mut question: Question) -> Self {
        let section = &mut self.questionnaire.sections[0];
        question.order = section.questions.len() as u32 + 1;
        section.questions.push(question);
        self
    }

    pub fn build(self) -> Questionnaire {
        self.questionnaire
    }

    pub fn insert(self, db: &Database) -> Questionnaire {
        let mut questionnaire = self.build();
        questionnaire.id = questionnaire_repo::insert(db, &questionnaire)
            .expect("Failed to insert questionnaire");
        questionnaire
    }
}

/// A questionnaire whose question `i` offers exactly `risks[i]`, so
/// answering every question yields those risks.
pub fn questionnaire_with_risks(db: &Database, name: &str, risks: &[Risk]) -> Questionnaire {
    risks
        .iter()
        .enumerate()
        .fold(QuestionnaireBuilder::new(name), |b, (i, risk)| {
            b.question(&format!("q{}", i + 1), &[*risk])
        })
        .insert(db)
}

/// Builder for answered `Assessment` rows.
pub struct AssessmentBuilder {
    assessment: Assessment,
}

impl AssessmentBuilder {
    pub fn new(owner: AssessmentOwner, questionnaire: &Questionnaire) -> Self {
        Self {
            assessment: Assessment::from_questionnaire(owner, questionnaire),
        }
    }

    pub fn for_application(id: i64, questionnaire: &Questionnaire) -> Self {
        Self::new(AssessmentOwner::Application(id), questionnaire)
    }

    pub fn for_archetype(id: i64, questionnaire: &Questionnaire) -> Self {
        Self::new(AssessmentOwner::Archetype(id), questionnaire)
    }

    /// Selects answer `answer` of every question.
    pub fn answer_all(mut self, answer: usize) -> Self {
        for section in &mut self.assessment.sections {
            for question in &mut section.questions {
                if let Some(a) = question.answers.get_mut(answer) {
                    a.selected = true;
                }
            }
        }
        self
    }

    /// Selects answer `answer` of question `question` in the first section.
    pub fn answer(mut self, question: usize, answer: usize) -> Self {
        self.assessment.sections[0].questions[question].answers[answer].selected = true;
        self
    }

    /// Adds tags applied by the first answer of the first question.
    pub fn applying(mut self, tags: &[(&str, &str)]) -> Self {
        let answer = &mut self.assessment.sections[0].questions[0].answers[0];
        answer
            .apply_tags
            .extend(tags.iter().map(|(c, t)| CategorizedTag::new(*c, *t)));
        self
    }

    pub fn build(self) -> Assessment {
        self.assessment
    }

    pub fn insert(self, db: &Database) -> Assessment {
        let mut assessment = self.build();
        assessment.id =
            assessment_repo::insert(db, &assessment).expect("Failed to insert assessment");
        assessment
    }
}

/// Builder for `Application` rows.
pub struct ApplicationBuilder {
    application: Application,
}

impl ApplicationBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            application: Application {
                name: name.to_string(),
                ..Default::default()
            },
        }
    }

    pub fn tags(mut self, tags: &[Tag]) -> Self {
        self.application.tags.extend(tags.iter().cloned());
        self
    }

    pub fn bucket(mut self, bucket_id: i64) -> Self {
        self.application.bucket_id = Some(bucket_id);
        self
    }

    /// Inserts the application and returns its id.
    pub fn insert(self, db: &Database) -> i64 {
        application_repo::insert(db, &self.application).expect("Failed to insert application")
    }
}

/// Builder for `Archetype` rows.
pub struct ArchetypeBuilder {
    archetype: Archetype,
}

impl ArchetypeBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            archetype: Archetype {
                name: name.to_string(),
                ..Default::default()
            },
        }
    }

    pub fn criteria(mut self, tags: &[Tag]) -> Self {
        self.archetype.criteria_tags.extend(tags.iter().cloned());
        self
    }

    pub fn tags(mut self, tags: &[Tag]) -> Self {
        self.archetype.tags.extend(tags.iter().cloned());
        self
    }

    /// Inserts the archetype and returns its id.
    pub fn insert(self, db: &Database) -> i64 {
        archetype_repo::insert(db, &self.archetype).expect("Failed to insert archetype")
    }
}

/// Reloads an application with its tags and assessments.
pub fn load_application(db: &Database, id: i64) -> Application {
    application_repo::find_by_id(db, id)
        .expect("Failed to load application")
        .expect("Application not found")
}

pub fn load_archetype(db: &Database, id: i64) -> Archetype {
    archetype_repo::find_by_id(db, id)
        .expect("Failed to load archetype")
        .expect("Archetype not found")
}
