mod common;

use uuid::Uuid;

use common::pending_image;
use spolky_admin::models::tutorial::PersistedSlide;
use spolky_admin::slides::{ImageRef, MoveDirection, SlideEdit, SlideList};

fn row(id: Uuid, order: i32, url: Option<&str>) -> PersistedSlide {
    PersistedSlide {
        id,
        tutorial_id: Uuid::nil(),
        order,
        layout: "single".to_string(),
        image_url: url.map(String::from),
    }
}

fn ids(list: &SlideList) -> Vec<Option<Uuid>> {
    list.as_slice().iter().map(|s| s.id).collect()
}

#[test]
fn test_from_persisted_sorts_by_order() {
    let [a, b, c] = [Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];
    let list = SlideList::from_persisted(vec![row(c, 3, None), row(a, 1, Some("http://h/a.webp")), row(b, 2, None)]);

    assert_eq!(ids(&list), vec![Some(a), Some(b), Some(c)]);
    assert_eq!(
        list.as_slice()[0].image,
        Some(ImageRef::Persisted("http://h/a.webp".to_string()))
    );
}

#[test]
fn test_push_blank_appends_slide_without_id_or_image() {
    let mut list = SlideList::new();
    list.push(SlideEdit::existing(Uuid::new_v4(), None));
    list.push_blank();

    assert_eq!(list.len(), 2);
    assert_eq!(list.as_slice()[1], SlideEdit::blank());
    assert!(list.as_slice()[1].id.is_none());
    assert!(list.as_slice()[1].image.is_none());
}

#[test]
fn test_move_slide_swaps_neighbours() {
    let [a, b, c] = [Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];
    let mut list: SlideList = [a, b, c].into_iter().map(|id| SlideEdit::existing(id, None)).collect();

    assert!(list.move_slide(0, MoveDirection::Down));
    assert_eq!(ids(&list), vec![Some(b), Some(a), Some(c)]);

    assert!(list.move_slide(2, MoveDirection::Up));
    assert_eq!(ids(&list), vec![Some(b), Some(c), Some(a)]);
}

#[test]
fn test_move_slide_is_noop_at_the_ends() {
    let [a, b] = [Uuid::new_v4(), Uuid::new_v4()];
    let mut list: SlideList = [a, b].into_iter().map(|id| SlideEdit::existing(id, None)).collect();

    assert!(!list.move_slide(0, MoveDirection::Up));
    assert!(!list.move_slide(1, MoveDirection::Down));
    assert!(!list.move_slide(5, MoveDirection::Up));
    assert_eq!(ids(&list), vec![Some(a), Some(b)]);
}

#[test]
fn test_remove_and_attach_image() {
    let [a, b] = [Uuid::new_v4(), Uuid::new_v4()];
    let mut list: SlideList = [a, b].into_iter().map(|id| SlideEdit::existing(id, None)).collect();

    let removed = list.remove(0).unwrap();
    assert_eq!(removed.id, Some(a));
    assert!(list.remove(3).is_none());

    assert!(list.attach_image(0, pending_image("shot")));
    assert!(!list.attach_image(1, pending_image("nope")));
    assert!(matches!(list.as_slice()[0].image, Some(ImageRef::Pending(_))));
    // The id survives, so the save updates rather than inserts
    assert_eq!(list.as_slice()[0].id, Some(b));
}
