//! Resource manager behaviour against a live database

mod common;

use std::sync::Arc;

use taskboard_shared::error::BoardError;
use taskboard_shared::models::list::ListInput;
use taskboard_shared::models::role::Role;
use taskboard_shared::models::sub_task::SubTaskInput;
use taskboard_shared::models::tag::TagInput;
use taskboard_shared::models::tag_card::TagCardInput;
use taskboard_shared::services::cards::{CardManager, CardPatch};
use taskboard_shared::services::comments::CommentManager;
use taskboard_shared::services::projects::{MemberAssignment, ProjectManager, ProjectPatch};
use taskboard_shared::services::users::{NewUser, UserManager, UserPatch};

/// Creates a project owned by a fresh user with one list; returns (user, project, list)
async fn board(pool: &sqlx::PgPool) -> (i64, i64, i64) {
    let owner = common::create_user(pool).await;
    let projects = ProjectManager::new(pool.clone());

    let project = projects
        .create(&common::unique("P"), "", owner.id)
        .await
        .unwrap();

    let detail = projects
        .update(
            project.id,
            owner.id,
            ProjectPatch {
                lists: Some(vec![ListInput {
                    id: None,
                    name: "To do".to_string(),
                    order: 0,
                }]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    (owner.id, project.id, detail.lists[0].id)
}

#[tokio::test]
async fn test_project_creator_becomes_super_admin() {
    let Some(pool) = common::test_pool().await else { return };
    let user = common::create_user(&pool).await;
    let projects = ProjectManager::new(pool.clone());

    let project = projects.create("P1", "first", user.id).await.unwrap();

    let listed = projects.list_for_user(user.id).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, project.id);
    assert_eq!(listed[0].title, "P1");

    let detail = projects.get_for_user(project.id, user.id).await.unwrap();
    assert_eq!(detail.creator.id, user.id);
    assert_eq!(detail.members.len(), 1);
    assert_eq!(detail.members[0].role, Role::SuperAdmin);
    assert!(detail.lists.is_empty());
}

#[tokio::test]
async fn test_membership_gates_project_access() {
    let Some(pool) = common::test_pool().await else { return };
    let (owner, project_id, _) = board(&pool).await;
    let outsider = common::create_user(&pool).await;
    let projects = ProjectManager::new(pool.clone());

    assert!(matches!(
        projects.get_for_user(project_id, outsider.id).await,
        Err(BoardError::NotFound(_))
    ));

    let members = projects
        .update_members(
            project_id,
            vec![
                MemberAssignment {
                    id: None,
                    user_id: owner,
                    role: Role::SuperAdmin,
                },
                MemberAssignment {
                    id: None,
                    user_id: outsider.id,
                    role: Role::User,
                },
            ],
            owner,
        )
        .await
        .unwrap();
    assert_eq!(members.len(), 2);

    let detail = projects.get_for_user(project_id, outsider.id).await.unwrap();
    assert_eq!(detail.project.id, project_id);

    // A plain member cannot manage members
    let result = projects
        .update_members(project_id, Vec::new(), outsider.id)
        .await;
    assert!(matches!(result, Err(BoardError::Forbidden(_))));
}

#[tokio::test]
async fn test_member_update_is_idempotent() {
    let Some(pool) = common::test_pool().await else { return };
    let (owner, project_id, _) = board(&pool).await;
    let other = common::create_user(&pool).await;
    let projects = ProjectManager::new(pool.clone());

    let current = projects.get_for_user(project_id, owner).await.unwrap().members;
    let mut submitted: Vec<MemberAssignment> = current
        .iter()
        .map(|m| MemberAssignment {
            id: Some(m.id),
            user_id: m.user_id,
            role: m.role,
        })
        .collect();
    submitted.push(MemberAssignment {
        id: None,
        user_id: other.id,
        role: Role::Leader,
    });

    let first = projects
        .update_members(project_id, submitted, owner)
        .await
        .unwrap();

    let again: Vec<MemberAssignment> = first
        .iter()
        .map(|m| MemberAssignment {
            id: Some(m.id),
            user_id: m.user_id,
            role: m.role,
        })
        .collect();
    let second = projects.update_members(project_id, again, owner).await.unwrap();

    let ids = |v: &[taskboard_shared::models::membership::MemberView]| {
        v.iter().map(|m| (m.id, m.user_id, m.role)).collect::<Vec<_>>()
    };
    assert_eq!(ids(&first), ids(&second));
    assert_eq!(second.len(), 2);
}

#[tokio::test]
async fn test_member_rows_can_swap_users() {
    let Some(pool) = common::test_pool().await else { return };
    let (owner, project_id, _) = board(&pool).await;
    let other = common::create_user(&pool).await;
    let projects = ProjectManager::new(pool.clone());

    let members = projects
        .update_members(
            project_id,
            vec![
                MemberAssignment {
                    id: None,
                    user_id: owner,
                    role: Role::SuperAdmin,
                },
                MemberAssignment {
                    id: None,
                    user_id: other.id,
                    role: Role::Leader,
                },
            ],
            owner,
        )
        .await
        .unwrap();
    let row_of = |user_id: i64| members.iter().find(|m| m.user_id == user_id).unwrap().id;
    let (owner_row, other_row) = (row_of(owner), row_of(other.id));

    let swapped = projects
        .update_members(
            project_id,
            vec![
                MemberAssignment {
                    id: Some(owner_row),
                    user_id: other.id,
                    role: Role::Leader,
                },
                MemberAssignment {
                    id: Some(other_row),
                    user_id: owner,
                    role: Role::SuperAdmin,
                },
            ],
            owner,
        )
        .await
        .unwrap();

    let mut pairs: Vec<_> = swapped.iter().map(|m| (m.id, m.user_id, m.role)).collect();
    pairs.sort_by_key(|pair| pair.0);
    let mut expected = vec![
        (owner_row, other.id, Role::Leader),
        (other_row, owner, Role::SuperAdmin),
    ];
    expected.sort_by_key(|pair| pair.0);
    assert_eq!(pairs, expected);
}

#[tokio::test]
async fn test_member_listed_twice_is_rejected() {
    let Some(pool) = common::test_pool().await else { return };
    let (owner, project_id, _) = board(&pool).await;
    let projects = ProjectManager::new(pool.clone());

    let result = projects
        .update_members(
            project_id,
            vec![
                MemberAssignment {
                    id: None,
                    user_id: owner,
                    role: Role::SuperAdmin,
                },
                MemberAssignment {
                    id: None,
                    user_id: owner,
                    role: Role::User,
                },
            ],
            owner,
        )
        .await;
    assert!(matches!(result, Err(BoardError::Validation(_))));

    let detail = projects.get_for_user(project_id, owner).await.unwrap();
    assert_eq!(detail.members.len(), 1);
}

#[tokio::test]
async fn test_outsider_cannot_manage_members() {
    let Some(pool) = common::test_pool().await else { return };
    let (_, project_id, _) = board(&pool).await;
    let outsider = common::create_user(&pool).await;

    let result = ProjectManager::new(pool.clone())
        .update_members(project_id, Vec::new(), outsider.id)
        .await;

    assert!(matches!(result, Err(BoardError::Forbidden(_))));
}

#[tokio::test]
async fn test_only_creator_deletes_project() {
    let Some(pool) = common::test_pool().await else { return };
    let (owner, project_id, _) = board(&pool).await;
    let admin = common::create_user(&pool).await;
    let projects = ProjectManager::new(pool.clone());

    let current = projects.get_for_user(project_id, owner).await.unwrap().members;
    projects
        .update_members(
            project_id,
            vec![
                MemberAssignment {
                    id: Some(current[0].id),
                    user_id: owner,
                    role: Role::SuperAdmin,
                },
                MemberAssignment {
                    id: None,
                    user_id: admin.id,
                    role: Role::SuperAdmin,
                },
            ],
            owner,
        )
        .await
        .unwrap();

    assert!(matches!(
        projects.delete(project_id, admin.id).await,
        Err(BoardError::Forbidden(_))
    ));

    projects.delete(project_id, owner).await.unwrap();
    assert!(matches!(
        projects.get_for_user(project_id, owner).await,
        Err(BoardError::NotFound(_))
    ));
    assert!(matches!(
        projects.delete(project_id, owner).await,
        Err(BoardError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_project_update_reconciles_lists_and_tags() {
    let Some(pool) = common::test_pool().await else { return };
    let (owner, project_id, todo) = board(&pool).await;
    let projects = ProjectManager::new(pool.clone());

    let detail = projects
        .update(
            project_id,
            owner,
            ProjectPatch {
                title: Some("Renamed".to_string()),
                lists: Some(vec![
                    ListInput {
                        id: Some(todo),
                        name: "Backlog".to_string(),
                        order: 1,
                    },
                    ListInput {
                        id: None,
                        name: "Now".to_string(),
                        order: 0,
                    },
                ]),
                tags: Some(vec![TagInput {
                    id: None,
                    name: "bug".to_string(),
                }]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(detail.project.title, "Renamed");
    let names: Vec<&str> = detail.lists.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, vec!["Now", "Backlog"]);
    assert_eq!(detail.lists[1].id, todo);
    assert_eq!(detail.tags.len(), 1);

    // Omitting `lists` leaves them alone
    let detail = projects
        .update(project_id, owner, ProjectPatch::default())
        .await
        .unwrap();
    assert_eq!(detail.lists.len(), 2);
    assert_eq!(detail.project.title, "Renamed");
}

#[tokio::test]
async fn test_cards_are_numbered_per_project() {
    let Some(pool) = common::test_pool().await else { return };
    let (_, _, list_id) = board(&pool).await;
    let cards = CardManager::new(pool.clone());

    let mut numbers = Vec::new();
    for title in ["one", "two", "three"] {
        numbers.push(cards.create(list_id, title).await.unwrap().card_number);
    }

    assert_eq!(numbers, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_new_card_has_empty_collections() {
    let Some(pool) = common::test_pool().await else { return };
    let (_, _, list_id) = board(&pool).await;
    let cards = CardManager::new(pool.clone());

    let card = cards.create(list_id, "T1").await.unwrap();
    let detail = cards.get(card.id).await.unwrap();

    assert_eq!(detail.card.card_number, 1);
    assert_eq!(detail.card.title, "T1");
    assert!(detail.tag_cards.is_empty());
    assert!(detail.approvers.is_empty());
    assert!(detail.comments.is_empty());
    assert!(detail.tasks_card.is_empty());
    assert!(detail.user.is_none());
}

#[tokio::test]
async fn test_card_in_missing_list_is_not_found() {
    let Some(pool) = common::test_pool().await else { return };

    let result = CardManager::new(pool.clone()).create(i64::MAX, "orphan").await;
    assert!(matches!(result, Err(BoardError::NotFound("List"))));
}

#[tokio::test]
async fn test_card_update_is_partial_and_reconciles() {
    let Some(pool) = common::test_pool().await else { return };
    let (owner, project_id, list_id) = board(&pool).await;
    let projects = ProjectManager::new(pool.clone());
    let cards = CardManager::new(pool.clone());

    let tags = projects
        .update(
            project_id,
            owner,
            ProjectPatch {
                tags: Some(vec![
                    TagInput {
                        id: None,
                        name: "ui".to_string(),
                    },
                    TagInput {
                        id: None,
                        name: "api".to_string(),
                    },
                ]),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .tags;

    let card = cards.create(list_id, "Checkout").await.unwrap();

    let patch: CardPatch = serde_json::from_value(serde_json::json!({
        "priority": 3,
        "user_id": owner,
        "tag_cards": [{"tag_id": tags[0].id}],
        "tasks_card": [{"title": "design"}, {"title": "build"}, {"title": "ship"}]
    }))
    .unwrap();
    let detail = cards.update(card.id, patch).await.unwrap();

    assert_eq!(detail.card.title, "Checkout");
    assert_eq!(detail.card.priority, Some(3));
    assert_eq!(detail.user.as_ref().map(|u| u.id), Some(owner));
    assert_eq!(detail.tag_cards.len(), 1);
    assert_eq!(detail.tag_cards[0].tag_name, "ui");
    assert_eq!(detail.tasks_card.len(), 3);

    // Keep one sub-task, add two, swap the tag; leave approvers untouched
    let kept = detail.tasks_card[1].id;
    let patch = CardPatch {
        tag_cards: Some(vec![TagCardInput {
            id: Some(detail.tag_cards[0].id),
            tag_id: tags[1].id,
        }]),
        tasks_card: Some(vec![
            SubTaskInput {
                id: Some(kept),
                title: Some("build".to_string()),
                date: None,
                completed: true,
                user_id: None,
            },
            SubTaskInput {
                id: None,
                title: Some("test".to_string()),
                date: Some("friday".to_string()),
                completed: false,
                user_id: None,
            },
            SubTaskInput {
                id: None,
                title: Some("release".to_string()),
                date: None,
                completed: false,
                user_id: Some(owner),
            },
        ]),
        ..Default::default()
    };
    let detail = cards.update(card.id, patch).await.unwrap();

    assert_eq!(detail.card.priority, Some(3));
    assert_eq!(detail.tag_cards[0].tag_name, "api");
    assert_eq!(detail.tasks_card.len(), 1 + 2);
    assert!(detail.tasks_card.iter().any(|t| t.id == kept && t.completed));
    assert!(detail
        .tasks_card
        .iter()
        .all(|t| t.title.as_deref() != Some("design") && t.title.as_deref() != Some("ship")));

    // Empty list clears a collection
    let patch: CardPatch = serde_json::from_str(r#"{"tasks_card": []}"#).unwrap();
    let detail = cards.update(card.id, patch).await.unwrap();
    assert!(detail.tasks_card.is_empty());
    assert_eq!(detail.tag_cards.len(), 1);
}

#[tokio::test]
async fn test_card_delete_cascades() {
    let Some(pool) = common::test_pool().await else { return };
    let (owner, _, list_id) = board(&pool).await;
    let cards = CardManager::new(pool.clone());
    let comments = CommentManager::new(pool.clone());

    let card = cards.create(list_id, "Temp").await.unwrap();
    let comment = comments.add(card.id, "note", owner).await.unwrap();

    cards.delete(card.id).await.unwrap();

    assert!(matches!(cards.get(card.id).await, Err(BoardError::NotFound(_))));
    assert!(matches!(cards.delete(card.id).await, Err(BoardError::NotFound(_))));
    assert!(matches!(
        comments.delete(comment.id, owner).await,
        Err(BoardError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_only_author_edits_comment() {
    let Some(pool) = common::test_pool().await else { return };
    let (owner, _, list_id) = board(&pool).await;
    let other = common::create_user(&pool).await;
    let cards = CardManager::new(pool.clone());
    let comments = CommentManager::new(pool.clone());

    let card = cards.create(list_id, "Discuss").await.unwrap();
    let comment = comments.add(card.id, "first", owner).await.unwrap();

    assert!(matches!(
        comments.update(comment.id, "hijack", other.id).await,
        Err(BoardError::Forbidden(_))
    ));
    assert!(matches!(
        comments.delete(comment.id, other.id).await,
        Err(BoardError::Forbidden(_))
    ));

    let updated = comments.update(comment.id, "edited", owner).await.unwrap();
    assert_eq!(updated.description, "edited");
    assert!(updated.updated_at.is_some());

    let detail = cards.get(card.id).await.unwrap();
    assert_eq!(detail.comments.len(), 1);
    assert_eq!(detail.comments[0].user.as_ref().map(|u| u.id), Some(owner));

    assert!(matches!(
        comments.add(i64::MAX, "nowhere", owner).await,
        Err(BoardError::NotFound("Card"))
    ));
}

#[tokio::test]
async fn test_users_can_only_read_and_edit_themselves() {
    let Some(pool) = common::test_pool().await else { return };
    let (users, _) = common::user_manager(&pool);
    let me = common::create_user(&pool).await;
    let other = common::create_user(&pool).await;

    assert_eq!(users.get_by_id(me.id, me.id).await.unwrap().id, me.id);
    assert!(matches!(
        users.get_by_id(me.id, other.id).await,
        Err(BoardError::Forbidden(_))
    ));

    let patch = UserPatch {
        first_name: Some("Renamed".to_string()),
        ..Default::default()
    };
    assert!(matches!(
        users.update(me.id, other.id, patch.clone()).await,
        Err(BoardError::Forbidden(_))
    ));

    let updated = users.update(me.id, me.id, patch).await.unwrap();
    assert_eq!(updated.first_name, "Renamed");
    assert_eq!(updated.last_name.as_deref(), Some("User"));

    let taken = UserPatch {
        email: Some(other.email.clone()),
        ..Default::default()
    };
    assert!(matches!(
        users.update(me.id, me.id, taken).await,
        Err(BoardError::Conflict(_))
    ));
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let Some(pool) = common::test_pool().await else { return };
    let (users, _) = common::user_manager(&pool);
    let existing = common::create_user(&pool).await;

    let same_email = NewUser {
        username: common::unique("fresh"),
        email: existing.email.clone(),
        first_name: "Dup".to_string(),
        last_name: None,
        password: "password".to_string(),
        is_admin: false,
    };
    assert!(matches!(
        users.create(same_email).await,
        Err(BoardError::Conflict(_))
    ));

    let same_username = NewUser {
        username: existing.username.clone(),
        email: format!("{}@example.com", common::unique("fresh")),
        first_name: "Dup".to_string(),
        last_name: None,
        password: "password".to_string(),
        is_admin: false,
    };
    assert!(matches!(
        users.create(same_username).await,
        Err(BoardError::Conflict(_))
    ));
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let Some(pool) = common::test_pool().await else { return };
    let (users, _) = common::user_manager(&pool);
    let user = common::create_user(&pool).await;

    let session = users.login(&user.email, common::PASSWORD).await.unwrap();
    assert_eq!(users.authenticate(&session.token).await.unwrap().id, user.id);

    let wrong_password = users.login(&user.email, "not-it").await.unwrap_err();
    let unknown_email = users
        .login("nobody-here@example.com", common::PASSWORD)
        .await
        .unwrap_err();

    assert!(matches!(wrong_password, BoardError::InvalidCredentials));
    assert!(matches!(unknown_email, BoardError::InvalidCredentials));
    assert_eq!(wrong_password.to_string(), unknown_email.to_string());
}

#[tokio::test]
async fn test_password_reset_flow() {
    let Some(pool) = common::test_pool().await else { return };
    let (users, mailer) = common::user_manager(&pool);
    let user = common::create_user(&pool).await;

    users.forgot_password("unknown@example.com").await.unwrap();
    users.forgot_password(&user.email).await.unwrap();

    let mail = mailer
        .wait_for_message(&user.email, 5)
        .await
        .expect("Reset email should be sent");
    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent.iter().all(|m| m.to == user.email));

    let token = mail
        .body
        .split("token=")
        .nth(1)
        .expect("Reset link should carry a token")
        .trim()
        .to_string();

    // The reset token itself is not a session
    assert!(users.authenticate(&token).await.is_err());

    let session = users.exchange_reset_token(&token).await.unwrap();
    let caller = users.authenticate(&session.token).await.unwrap();
    users.reset_password(caller.id, "brand-new-pass").await.unwrap();

    assert!(users.login(&user.email, common::PASSWORD).await.is_err());
    assert!(users.login(&user.email, "brand-new-pass").await.is_ok());
}

#[tokio::test]
async fn test_forgot_password_does_not_wait_for_delivery() {
    let Some(pool) = common::test_pool().await else { return };
    let user = common::create_user(&pool).await;
    let users = UserManager::new(
        pool.clone(),
        common::token_service(),
        Arc::new(common::StalledMailer),
        "http://localhost:3000".to_string(),
    );

    let answered = tokio::time::timeout(
        std::time::Duration::from_secs(5),
        users.forgot_password(&user.email),
    )
    .await;

    assert!(matches!(answered, Ok(Ok(()))), "forgot_password waited on the mailer");
}
