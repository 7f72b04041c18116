mod common;

use common::{attempt, test_engine, TEST_COURSE};

#[tokio::test]
async fn wrong_attempt_creates_one_item() {
    let (store, service) = test_engine();

    let attempts = vec![
        attempt("q1").tags(&["Trees"]).wrong().build(),
        attempt("q2").tags(&["Trees"]).build(),
    ];
    store.insert_attempts(attempts.clone()).await;
    service
        .update_mastery_after_quiz(TEST_COURSE, &attempts)
        .await
        .unwrap();

    let bank = service.mistake_bank(TEST_COURSE).await.unwrap();
    assert_eq!(bank.len(), 1);
    let item = &bank[0];
    assert_eq!(item.question_id, "q1");
    assert_eq!(item.attempt_id, attempts[0].attempt_id);
    assert_eq!(item.topic_tags, vec!["Trees".to_string()]);
}

#[tokio::test]
async fn repeat_miss_across_sessions_does_not_duplicate() {
    let (store, service) = test_engine();

    let first = vec![attempt("q7").session("s-1").tags(&["DP"]).wrong().build()];
    store.insert_attempts(first.clone()).await;
    service
        .update_mastery_after_quiz(TEST_COURSE, &first)
        .await
        .unwrap();

    let second = vec![attempt("q7").session("s-2").tags(&["DP"]).wrong().build()];
    store.insert_attempts(second.clone()).await;
    service
        .update_mastery_after_quiz(TEST_COURSE, &second)
        .await
        .unwrap();

    let bank = service.mistake_bank(TEST_COURSE).await.unwrap();
    assert_eq!(bank.len(), 1);
    // The surviving item is the one created by the first miss.
    assert_eq!(bank[0].attempt_id, first[0].attempt_id);
}

#[tokio::test]
async fn repeat_miss_within_one_session_does_not_duplicate() {
    let (store, service) = test_engine();

    let attempts = vec![
        attempt("q3").tags(&["BFS"]).wrong().build(),
        attempt("q3").tags(&["BFS"]).wrong().build(),
    ];
    store.insert_attempts(attempts.clone()).await;
    service
        .update_mastery_after_quiz(TEST_COURSE, &attempts)
        .await
        .unwrap();

    let bank = service.mistake_bank(TEST_COURSE).await.unwrap();
    assert_eq!(bank.len(), 1);
}

#[tokio::test]
async fn correct_attempts_never_reach_the_bank() {
    let (store, service) = test_engine();

    let attempts = vec![
        attempt("q1").tags(&["Trees"]).build(),
        attempt("q2").tags(&["Graphs"]).build(),
    ];
    store.insert_attempts(attempts.clone()).await;
    service
        .update_mastery_after_quiz(TEST_COURSE, &attempts)
        .await
        .unwrap();

    assert!(service.mistake_bank(TEST_COURSE).await.unwrap().is_empty());
}

#[tokio::test]
async fn multi_tag_miss_creates_single_item_with_all_tags() {
    let (store, service) = test_engine();

    let attempts = vec![attempt("q5").tags(&["Trees", "BFS"]).wrong().build()];
    store.insert_attempts(attempts.clone()).await;
    let deltas = service
        .update_mastery_after_quiz(TEST_COURSE, &attempts)
        .await
        .unwrap();

    // Two topics recomputed, but the bank keys on the question.
    assert_eq!(deltas.len(), 2);
    let bank = service.mistake_bank(TEST_COURSE).await.unwrap();
    assert_eq!(bank.len(), 1);
    assert_eq!(
        bank[0].topic_tags,
        vec!["Trees".to_string(), "BFS".to_string()]
    );
}

#[tokio::test]
async fn resolution_fields_start_unset_and_stay_untouched() {
    let (store, service) = test_engine();

    let first = vec![attempt("q9").tags(&["DP"]).wrong().build()];
    store.insert_attempts(first.clone()).await;
    service
        .update_mastery_after_quiz(TEST_COURSE, &first)
        .await
        .unwrap();

    // A later miss on the same question must not reset or bump anything.
    let second = vec![attempt("q9").session("s-2").tags(&["DP"]).wrong().build()];
    store.insert_attempts(second.clone()).await;
    service
        .update_mastery_after_quiz(TEST_COURSE, &second)
        .await
        .unwrap();

    let bank = service.mistake_bank(TEST_COURSE).await.unwrap();
    assert_eq!(bank.len(), 1);
    assert!(bank[0].resolved_at.is_none());
    assert!(bank[0].review_count.is_none());
}

#[tokio::test]
async fn untagged_wrong_attempt_still_lands_in_the_bank() {
    let (store, service) = test_engine();

    let attempts = vec![attempt("q4").wrong().build()];
    store.insert_attempts(attempts.clone()).await;
    let deltas = service
        .update_mastery_after_quiz(TEST_COURSE, &attempts)
        .await
        .unwrap();

    // No topics touched, but the miss is still banked.
    assert!(deltas.is_empty());
    let bank = service.mistake_bank(TEST_COURSE).await.unwrap();
    assert_eq!(bank.len(), 1);
    assert!(bank[0].topic_tags.is_empty());
}
