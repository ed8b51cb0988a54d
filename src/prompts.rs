//! Prompts and response schemas used by the learning widgets
//!
//! Every prompt here passes the educational-input whitelist on its own;
//! prompts that embed a story or a student's question can still be
//! rejected by the gateway if the embedded text does not.

use serde::{Deserialize, Serialize};

use crate::request::PromptRequest;
use crate::schema::{FieldKind, ResponseSchema};

/// Planets in order from the sun
pub const PLANETS: [&str; 8] = [
  "Mercury", "Venus", "Earth", "Mars",
  "Jupiter", "Saturn", "Uranus", "Neptune"
];

// ===== Math =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordProblem
{   pub problem: String
  , pub answer: f64
}

impl WordProblem
{   /// Students type whole numbers; compare after trimming
    pub fn check(&self, student_answer: &str) -> bool
    {   student_answer
          .trim()
          .parse::<f64>()
          .map(|n| n == self.answer)
          .unwrap_or(false)
    }
}

pub fn word_problem_schema() -> ResponseSchema
{   ResponseSchema::new()
      .required("problem", FieldKind::String)
      .required("answer", FieldKind::Number)
}

pub fn word_problem() -> PromptRequest
{   PromptRequest::structured(
      "Generate a simple one-step multiplication or division word \
       problem for an 8-year-old. The answer must be a whole number. \
       Provide the problem and the numeric answer."
    , word_problem_schema()
    )
}

// ===== Reading =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story
{   pub story_title: String
  , pub story_text: String
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryQuestion
{   /// Question text
    pub q: String
  , /// Keywords accepted in an answer
    pub a: Vec<String>
}

impl StoryQuestion
{   /// Right if the answer mentions any accepted keyword
    pub fn check(&self, student_answer: &str) -> bool
    {   let answer = student_answer.trim().to_lowercase();
        !answer.is_empty()
          && self.a.iter().any(|k| answer.contains(&k.to_lowercase()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryQuestions
{   #[serde(default)]
    pub questions: Vec<StoryQuestion>
}

pub fn story_schema() -> ResponseSchema
{   ResponseSchema::new()
      .required("storyTitle", FieldKind::String)
      .required("storyText", FieldKind::String)
}

pub fn story_questions_schema() -> ResponseSchema
{   let question = ResponseSchema::new()
      .required("q", FieldKind::String)
      .required("a", FieldKind::array_of(FieldKind::String));
    ResponseSchema::new()
      .required("questions", FieldKind::array_of(FieldKind::Object(question)))
}

pub fn new_story() -> PromptRequest
{   PromptRequest::structured(
      "Write a short, engaging story for 3rd grade students (about \
       100-150 words). The story should:\n\
       - Have 2-3 main characters with simple names\n\
       - Include a clear problem and solution\n\
       - Be positive and age-appropriate\n\
       - Have a clear beginning, middle, and end\n\
       - Use vocabulary suitable for 8-9 year olds"
    , story_schema()
    )
}

pub fn story_questions(story_text: &str) -> PromptRequest
{   PromptRequest::structured(
      format!(
        "Based on this story: \"{}\"\n\nCreate exactly 3 simple \
         comprehension questions suitable for 3rd graders. For each \
         question, provide possible correct answers (keywords that \
         would be acceptable in a student's response).",
        story_text
      )
    , story_questions_schema()
    )
}

/// Questions used when generating them for a new story fails
pub fn fallback_questions() -> Vec<StoryQuestion>
{   vec![
      StoryQuestion
      {   q: "Who are the main characters in this story?".to_string()
        , a: vec!["character".to_string(), "main".to_string()]
      }
    , StoryQuestion
      {   q: "What problem happens in the story?".to_string()
        , a: vec!["problem".to_string()]
      }
    , StoryQuestion
      {   q: "How does the story end?".to_string()
        , a: vec!["end".to_string(), "happy".to_string()]
      }
    ]
}

pub fn continue_story(story_text: &str) -> PromptRequest
{   PromptRequest::text(format!(
      "Here is a short story for children: \"{}\". Please write one \
       creative paragraph that continues this story. Keep it simple \
       and positive.",
      story_text
    ))
}

// ===== Science =====

pub fn planet_question(planet: &str, question: &str) -> PromptRequest
{   PromptRequest::text(format!(
      "You are the planet {}. In one or two simple, friendly sentences \
       suitable for an 8-year-old, answer this question: \"{}\"",
      planet, question
    ))
}

#[cfg(test)]
mod tests
{   use super::*;
    use crate::request::ApiResponse;
    use crate::security::is_valid_educational_input;
    use serde_json::json;

    #[test]
    fn fixed_prompts_pass_whitelist()
    {   assert!(is_valid_educational_input(&word_problem().prompt));
        assert!(is_valid_educational_input(&new_story().prompt));
        assert!(is_valid_educational_input(
          &planet_question("Mars", "Why are you red?").prompt
        ));
        assert!(is_valid_educational_input(
          &continue_story("Leo the lizard loved the sun.").prompt
        ));
    }

    #[test]
    fn embedded_text_can_fail_whitelist()
    {   let request = planet_question("Mars", "<b>hi</b>; drop");
        assert!(!is_valid_educational_input(&request.prompt));
    }

    #[test]
    fn decodes_word_problem()
    {   let response = ApiResponse::Json(json!({
          "problem": "Sam has 3 bags with 4 apples each. How many apples?",
          "answer": 12
        }));
        let problem: WordProblem = response.decode().expect("word problem");
        assert!(problem.check(" 12 "));
        assert!(!problem.check("13"));
        assert!(!problem.check("twelve"));
    }

    #[test]
    fn decodes_story_and_questions()
    {   let story: Story = ApiResponse::Json(json!({
          "storyTitle": "Max and the Kite",
          "storyText": "Max lost his kite."
        })).decode().expect("story");
        assert_eq!(story.story_title, "Max and the Kite");

        let questions: StoryQuestions = ApiResponse::Json(json!({
          "questions": [{ "q": "Who lost a kite?", "a": ["max"] }]
        })).decode().expect("questions");
        assert!(questions.questions[0].check("It was Max"));
        assert!(!questions.questions[0].check(""));
    }

    #[test]
    fn text_does_not_decode()
    {   let result: Result<Story, _>
          = ApiResponse::Text("a story".to_string()).decode();
        assert!(result.is_err());
    }

    #[test]
    fn fallback_has_three_questions()
    {   assert_eq!(fallback_questions().len(), 3);
    }

    #[test]
    fn every_planet_prompt_passes_the_whitelist()
    {   for planet in PLANETS
        {   let request = planet_question(planet, "Why are you so cold?");
            assert!(is_valid_educational_input(&request.prompt), "{}", planet);
        }
    }
}
