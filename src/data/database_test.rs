//! Database tests

use super::*;
use crate::error::AppError;
use chrono::{Duration, Utc};
use tempfile::TempDir;

/// Helper to create a test database
async fn create_test_db() -> (Database, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let db = Database::connect(&db_path).await.unwrap();
    (db, temp_dir)
}

fn user(username: &str) -> User {
    User {
        id: EntityId::new().0,
        username: username.to_string(),
        email: format!("{username}@example.com"),
        password_hash: "hash".to_string(),
        bio: None,
        role: Role::Member.as_str().to_string(),
        created_at: Utc::now(),
    }
}

fn post(author: &User, title: &str) -> Post {
    Post {
        id: EntityId::new().0,
        title: title.to_string(),
        content: format!("{title} body"),
        author_id: author.id.clone(),
        created_at: Utc::now(),
        updated_at: None,
    }
}

fn like(user: &User, post: &Post) -> Like {
    Like {
        id: EntityId::new().0,
        user_id: user.id.clone(),
        post_id: post.id.clone(),
        created_at: Utc::now(),
    }
}

#[tokio::test]
async fn test_database_connection() {
    let (_db, _temp_dir) = create_test_db().await;
}

#[tokio::test]
async fn test_user_insert_and_lookup() {
    let (db, _temp_dir) = create_test_db().await;

    let alice = user("alice");
    db.insert_user(&alice).await.unwrap();

    let by_id = db.get_user(&alice.id).await.unwrap().unwrap();
    assert_eq!(by_id.username, "alice");
    assert_eq!(by_id.role(), Role::Member);

    // Usernames compare case-insensitively
    let by_name = db.get_user_by_username("ALICE").await.unwrap();
    assert!(by_name.is_some());
    assert!(db.username_exists("Alice").await.unwrap());
    assert!(db.email_exists("alice@example.com", None).await.unwrap());
    assert!(
        !db.email_exists("alice@example.com", Some(&alice.id))
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn test_duplicate_username_maps_to_field_error() {
    let (db, _temp_dir) = create_test_db().await;

    db.insert_user(&user("alice")).await.unwrap();

    let mut duplicate = user("Alice");
    duplicate.email = "other@example.com".to_string();
    let error = db.insert_user(&duplicate).await.unwrap_err();
    assert!(matches!(
        error,
        AppError::Validation {
            field: Some("username"),
            ..
        }
    ));

    let mut same_email = user("bob");
    same_email.email = "alice@example.com".to_string();
    let error = db.insert_user(&same_email).await.unwrap_err();
    assert!(matches!(
        error,
        AppError::Validation {
            field: Some("email"),
            ..
        }
    ));
}

#[tokio::test]
async fn test_follow_edge_is_unique_and_notifies_once() {
    let (db, _temp_dir) = create_test_db().await;

    let alice = user("alice");
    let bob = user("bob");
    db.insert_user(&alice).await.unwrap();
    db.insert_user(&bob).await.unwrap();

    let follow = Follow {
        follower_id: alice.id.clone(),
        followee_id: bob.id.clone(),
        created_at: Utc::now(),
    };

    let first = Notification::new(&bob.id, &alice.id, NotificationVerb::Followed, &alice.username);
    assert!(db.insert_follow(&follow, &first).await.unwrap());

    let second = Notification::new(&bob.id, &alice.id, NotificationVerb::Followed, &alice.username);
    assert!(!db.insert_follow(&follow, &second).await.unwrap());

    assert!(db.is_following(&alice.id, &bob.id).await.unwrap());
    assert!(!db.is_following(&bob.id, &alice.id).await.unwrap());
    assert_eq!(db.count_follow_edges(&alice.id).await.unwrap(), (1, 0));
    assert_eq!(db.count_follow_edges(&bob.id).await.unwrap(), (0, 1));
    assert_eq!(db.count_unread_notifications(&bob.id).await.unwrap(), 1);

    let following = db.get_following(&alice.id).await.unwrap();
    assert_eq!(following.len(), 1);
    assert_eq!(following[0].id, bob.id);

    assert!(db.delete_follow(&alice.id, &bob.id).await.unwrap());
    assert!(!db.delete_follow(&alice.id, &bob.id).await.unwrap());
    assert!(db.get_followers(&bob.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_post_crud_with_tags() {
    let (db, _temp_dir) = create_test_db().await;

    let alice = user("alice");
    db.insert_user(&alice).await.unwrap();

    let mut first = post(&alice, "Rust tips");
    db.insert_post(&first, &["rust".to_string(), "tips".to_string()])
        .await
        .unwrap();

    let view = db.get_post_view(&first.id).await.unwrap().unwrap();
    assert_eq!(view.author_username, "alice");
    assert_eq!(view.likes_count, 0);
    assert_eq!(view.comments_count, 0);

    let tags = db.get_tags_for_posts(&[first.id.clone()]).await.unwrap();
    assert_eq!(tags[&first.id], vec!["rust".to_string(), "tips".to_string()]);

    // Tag lookup is case-insensitive
    let filter = PostFilter {
        tag: Some("RUST".to_string()),
        limit: 20,
        ..Default::default()
    };
    assert_eq!(db.list_posts(&filter).await.unwrap().len(), 1);

    first.title = "Rust tricks".to_string();
    first.updated_at = Some(Utc::now());
    assert!(db
        .update_post(&first, Some(&["tricks".to_string()]))
        .await
        .unwrap());
    let tags = db.get_tags_for_posts(&[first.id.clone()]).await.unwrap();
    assert_eq!(tags[&first.id], vec!["tricks".to_string()]);
    assert_eq!(db.get_post(&first.id).await.unwrap().unwrap().title, "Rust tricks");

    assert!(db.delete_post(&first.id).await.unwrap());
    assert!(db.get_post(&first.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_list_posts_search_escapes_wildcards() {
    let (db, _temp_dir) = create_test_db().await;

    let alice = user("alice");
    db.insert_user(&alice).await.unwrap();
    db.insert_post(&post(&alice, "100% coverage"), &[]).await.unwrap();
    db.insert_post(&post(&alice, "100 percent"), &[]).await.unwrap();

    let filter = PostFilter {
        search: Some("100%".to_string()),
        limit: 20,
        ..Default::default()
    };
    let posts = db.list_posts(&filter).await.unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].title, "100% coverage");
}

#[tokio::test]
async fn test_feed_contains_only_followed_authors_newest_first() {
    let (db, _temp_dir) = create_test_db().await;

    let alice = user("alice");
    let bob = user("bob");
    let carol = user("carol");
    for u in [&alice, &bob, &carol] {
        db.insert_user(u).await.unwrap();
    }

    let now = Utc::now();
    let mut older = post(&bob, "older");
    older.created_at = now - Duration::minutes(10);
    let mut newer = post(&bob, "newer");
    newer.created_at = now;
    let unrelated = post(&carol, "carol's");
    db.insert_post(&older, &[]).await.unwrap();
    db.insert_post(&newer, &[]).await.unwrap();
    db.insert_post(&unrelated, &[]).await.unwrap();

    assert!(db.get_feed(&alice.id).await.unwrap().is_empty());

    let follow = Follow {
        follower_id: alice.id.clone(),
        followee_id: bob.id.clone(),
        created_at: now,
    };
    let notification = Notification::new(&bob.id, &alice.id, NotificationVerb::Followed, "alice");
    db.insert_follow(&follow, &notification).await.unwrap();

    let feed = db.get_feed(&alice.id).await.unwrap();
    let titles: Vec<_> = feed.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, vec!["newer", "older"]);
}

#[tokio::test]
async fn test_like_is_idempotent_and_notification_is_atomic() {
    let (db, _temp_dir) = create_test_db().await;

    let alice = user("alice");
    let bob = user("bob");
    db.insert_user(&alice).await.unwrap();
    db.insert_user(&bob).await.unwrap();
    let bobs_post = post(&bob, "Hello");
    db.insert_post(&bobs_post, &[]).await.unwrap();

    let n1 = Notification::new(&bob.id, &alice.id, NotificationVerb::LikedPost, "Hello");
    let (stored, created) = db
        .insert_like(&like(&alice, &bobs_post), Some(&n1))
        .await
        .unwrap();
    assert!(created);

    let n2 = Notification::new(&bob.id, &alice.id, NotificationVerb::LikedPost, "Hello");
    let (existing, created) = db
        .insert_like(&like(&alice, &bobs_post), Some(&n2))
        .await
        .unwrap();
    assert!(!created);
    assert_eq!(existing.id, stored.id);

    assert_eq!(db.count_likes_by(&alice.id, &bobs_post.id).await.unwrap(), 1);
    let notifications = db.get_notifications(&bob.id, false, 20, 0).await.unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].verb, "liked your post");
    assert_eq!(notifications[0].target, "Hello");
    assert_eq!(notifications[0].actor_username, "alice");

    let liked = db
        .get_liked_post_ids(&alice.id, &[bobs_post.id.clone()])
        .await
        .unwrap();
    assert!(liked.contains(&bobs_post.id));

    assert!(db.delete_like(&alice.id, &bobs_post.id).await.unwrap());
    assert!(!db.delete_like(&alice.id, &bobs_post.id).await.unwrap());
}

#[tokio::test]
async fn test_failed_notification_rolls_back_like() {
    let (db, _temp_dir) = create_test_db().await;

    let alice = user("alice");
    db.insert_user(&alice).await.unwrap();
    let own_post = post(&alice, "Mine");
    db.insert_post(&own_post, &[]).await.unwrap();

    // recipient == actor violates the notifications CHECK constraint
    let invalid = Notification::new(&alice.id, &alice.id, NotificationVerb::LikedPost, "Mine");
    let result = db.insert_like(&like(&alice, &own_post), Some(&invalid)).await;
    assert!(result.is_err());

    assert_eq!(db.count_likes_by(&alice.id, &own_post.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_comment_operations() {
    let (db, _temp_dir) = create_test_db().await;

    let alice = user("alice");
    let bob = user("bob");
    db.insert_user(&alice).await.unwrap();
    db.insert_user(&bob).await.unwrap();
    let bobs_post = post(&bob, "Hello");
    db.insert_post(&bobs_post, &[]).await.unwrap();

    let mut comment = Comment {
        id: EntityId::new().0,
        content: "Nice".to_string(),
        author_id: alice.id.clone(),
        post_id: bobs_post.id.clone(),
        created_at: Utc::now(),
        updated_at: None,
    };
    let notification =
        Notification::new(&bob.id, &alice.id, NotificationVerb::CommentedOnPost, "Hello");
    db.insert_comment(&comment, Some(&notification)).await.unwrap();

    let view = db.get_comment_view(&comment.id).await.unwrap().unwrap();
    assert_eq!(view.author_username, "alice");
    assert_eq!(
        db.list_comments(Some(&bobs_post.id), 20, 0).await.unwrap().len(),
        1
    );
    assert_eq!(
        db.get_post_view(&bobs_post.id)
            .await
            .unwrap()
            .unwrap()
            .comments_count,
        1
    );

    comment.content = "Very nice".to_string();
    comment.updated_at = Some(Utc::now());
    assert!(db.update_comment(&comment).await.unwrap());
    assert_eq!(
        db.get_comment(&comment.id).await.unwrap().unwrap().content,
        "Very nice"
    );

    assert!(db.delete_comment(&comment.id).await.unwrap());
    assert!(db.get_comment(&comment.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_notification_read_state() {
    let (db, _temp_dir) = create_test_db().await;

    let alice = user("alice");
    let bob = user("bob");
    db.insert_user(&alice).await.unwrap();
    db.insert_user(&bob).await.unwrap();

    let follow = Follow {
        follower_id: alice.id.clone(),
        followee_id: bob.id.clone(),
        created_at: Utc::now(),
    };
    let notification = Notification::new(&bob.id, &alice.id, NotificationVerb::Followed, "alice");
    db.insert_follow(&follow, &notification).await.unwrap();

    // Only the recipient can mark it read
    assert!(!db
        .mark_notification_read(&notification.id, &alice.id)
        .await
        .unwrap());
    assert!(db
        .mark_notification_read(&notification.id, &bob.id)
        .await
        .unwrap());
    assert_eq!(db.count_unread_notifications(&bob.id).await.unwrap(), 0);
    assert!(db
        .get_notifications(&bob.id, true, 20, 0)
        .await
        .unwrap()
        .is_empty());
    assert_eq!(db.mark_all_notifications_read(&bob.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_book_catalog_operations() {
    let (db, _temp_dir) = create_test_db().await;

    let author = Author {
        id: EntityId::new().0,
        name: "Ursula K. Le Guin".to_string(),
    };
    db.insert_author(&author).await.unwrap();

    let mut earthsea = Book {
        id: EntityId::new().0,
        title: "A Wizard of Earthsea".to_string(),
        publication_year: 1968,
        author_id: author.id.clone(),
    };
    let dispossessed = Book {
        id: EntityId::new().0,
        title: "The Dispossessed".to_string(),
        publication_year: 1974,
        author_id: author.id.clone(),
    };
    db.insert_book(&earthsea).await.unwrap();
    db.insert_book(&dispossessed).await.unwrap();

    let by_year_desc = db
        .list_books(&BookFilter {
            ordering: BookOrdering::YearDesc,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_year_desc[0].title, "The Dispossessed");

    let search = db
        .list_books(&BookFilter {
            search: Some("le guin".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(search.len(), 2);

    earthsea.publication_year = 1969;
    assert!(db.update_book(&earthsea).await.unwrap());
    let year = db
        .list_books(&BookFilter {
            publication_year: Some(1969),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(year.len(), 1);

    let grouped = db.get_books_by_authors(&[author.id.clone()]).await.unwrap();
    assert_eq!(grouped[&author.id].len(), 2);

    assert!(db.delete_book(&earthsea.id).await.unwrap());
    assert!(db.get_book(&earthsea.id).await.unwrap().is_none());
    assert_eq!(db.list_authors().await.unwrap().len(), 1);
}
