use super::*;
use crate::canvas::page::{Page, Shape};

#[test]
fn card_spec_json_defaults() {
    let spec: CardSpec = serde_json::from_str(r#"{ "width": 63, "height": 88 }"#).unwrap();
    assert_eq!(spec, CardSpec::new(63.0, 88.0));
    assert!(spec.validate().is_ok());
}

#[test]
fn validation_rejects_degenerate_cards() {
    assert!(CardSpec::new(0.0, 10.0).validate().is_err());
    assert!(
        CardSpec::new(10.0, 10.0)
            .with_margins(Margins::uniform(-1.0))
            .validate()
            .is_err()
    );
}

#[test]
fn counts_expand_into_repeated_tokens() {
    let tokens = cards_from_specs(&[
        CardSpec::new(10.0, 20.0).with_count(3),
        CardSpec::new(5.0, 5.0).with_count(0),
        CardSpec::new(1.0, 2.0),
    ]);
    assert_eq!(tokens.len(), 4);
    assert_eq!(tokens[0].footprint(), Size::new(10.0, 20.0));
    assert_eq!(tokens[3].footprint(), Size::new(1.0, 2.0));
}

#[test]
fn card_draws_image_border_and_label() {
    let token = CardToken::new(
        CardSpec::new(30.0, 40.0)
            .with_image("face.png")
            .with_label("Goblin"),
    );
    let mut page = Page::new(0, Size::new(100.0, 100.0), None);
    {
        let mut view = page.view(crate::foundation::core::Rect::new(0.0, 0.0, 30.0, 40.0));
        token.draw(&mut view).unwrap();
    }
    let kinds: Vec<_> = page
        .commands()
        .iter()
        .map(|c| match &c.shape {
            Shape::Image { .. } => "image",
            Shape::Rect { .. } => "rect",
            Shape::Text { .. } => "text",
            _ => "other",
        })
        .collect();
    assert_eq!(kinds, ["image", "rect", "text"]);
}
