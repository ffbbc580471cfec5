table! {
    comments (id) {
        id -> Int4,
        post_id -> Int4,
        user_id -> Int4,
        body -> Text,
        version -> Int4,
        approved -> Bool,
        created_at -> Timestamptz,
    }
}

table! {
    page_categories (page_id, category) {
        page_id -> Int4,
        category -> Text,
    }
}

table! {
    pages (id) {
        id -> Int4,
        title -> Text,
        nav_title -> Text,
        slug -> Text,
        body -> Text,
        css -> Text,
        js -> Text,
        show_title -> Bool,
        show_nav -> Bool,
        icon -> Nullable<Text>,
        user_id -> Int4,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

table! {
    posts (id) {
        id -> Int4,
        title -> Text,
        content -> Nullable<Text>,
        published_at -> Timestamptz,
        author -> Int4,
    }
}

table! {
    users (id) {
        id -> Int4,
        name -> Text,
        joined_at -> Timestamptz,
    }
}

joinable!(comments -> posts (post_id));
joinable!(comments -> users (user_id));
joinable!(page_categories -> pages (page_id));
joinable!(pages -> users (user_id));
joinable!(posts -> users (author));

allow_tables_to_appear_in_same_query!(
    comments,
    page_categories,
    pages,
    posts,
    users,
);
