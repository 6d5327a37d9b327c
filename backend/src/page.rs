//! Server-rendered predictor form.

use adoption_inference::{AnimalDescriptor, AnimalType};

use crate::models::RenderedPrediction;

/// What goes in the result area below the button.
pub enum Outcome<'a> {
    Prediction(&'a RenderedPrediction),
    Failure(&'a str),
}

const STYLE: &str = "body{font-family:sans-serif;max-width:52rem;margin:2rem auto;padding:0 1rem}\
.cols{display:flex;gap:2rem}.cols fieldset{flex:1;border:none;padding:0}\
label{display:block;margin:.4rem 0}.error{color:#b00020}";

fn checked(on: bool) -> &'static str {
    if on {
        " checked"
    } else {
        ""
    }
}

fn checkbox(name: &str, label: &str, on: bool) -> String {
    format!(r#"<label><input type="checkbox" name="{name}"{}> {label}</label>"#, checked(on))
}

/// Renders the whole page with `descriptor` preselected.
pub fn render_page(descriptor: &AnimalDescriptor, outcome: Option<Outcome<'_>>) -> String {
    let radios: String = AnimalType::ALL
        .iter()
        .map(|t| {
            format!(
                r#"<label><input type="radio" name="animal_type" value="{0}"{1}> {0}</label>"#,
                t.as_str(),
                checked(descriptor.animal_type == *t)
            )
        })
        .collect();

    let result = match outcome {
        Some(Outcome::Prediction(p)) => format!(
            r#"<section id="result"><h3>{}</h3><p>{}</p></section>"#,
            p.headline, p.detail
        ),
        Some(Outcome::Failure(message)) => {
            format!(r#"<section id="result"><p class="error">{message}</p></section>"#)
        }
        None => String::new(),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>Will It Be Adopted?</title><style>{STYLE}</style></head>
<body>
<h1>Will It Be Adopted?</h1>
<h3>Describe Your Animal:</h3>
<form method="post" action="/predict">
<div class="cols">
<fieldset><legend>Is the animal a cat or dog?</legend>{radios}</fieldset>
<fieldset>{black}{female}{young}</fieldset>
<fieldset>{fixed}{intake}</fieldset>
</div>
<button type="submit">Click to Predict</button>
</form>
{result}
</body>
</html>
"#,
        black = checkbox("color_black", "Is the animal black?", descriptor.color_black),
        female = checkbox("female", "Is the animal female?", descriptor.female),
        young = checkbox(
            "young",
            "Is the animal less than 1 year old?",
            descriptor.younger_than_one_year
        ),
        fixed = checkbox("fixed", "Is the animal fixed?", descriptor.fixed),
        intake = checkbox(
            "intake_condition",
            "Is the animal not in a normal condition?",
            descriptor.abnormal_intake_condition
        ),
    )
}
