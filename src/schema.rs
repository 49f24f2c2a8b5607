diesel::table! {
    users (id) {
        id -> Integer,
        name -> Text,
        email -> Text,
        password_hash -> Text,
        created_at -> Timestamp,
    }
}

diesel::table! {
    contests (id) {
        id -> Integer,
        title -> Text,
        start_time -> Timestamp,
        end_time -> Timestamp,
        created_by -> Integer,
        created_at -> Timestamp,
    }
}

diesel::table! {
    problems (id) {
        id -> Integer,
        contest_id -> Nullable<Integer>,
        title -> Text,
        statement -> Text,
        time_limit -> Integer,
        memory_limit -> Integer,
        created_at -> Timestamp,
    }
}

diesel::table! {
    testcases (id) {
        id -> Integer,
        problem_id -> Integer,
        input -> Text,
        expected_output -> Text,
        is_sample -> Bool,
        created_at -> Timestamp,
    }
}

diesel::table! {
    submissions (id) {
        id -> Integer,
        user_id -> Integer,
        problem_id -> Integer,
        contest_id -> Nullable<Integer>,
        language -> Text,
        code -> Text,
        status -> Text,
        score -> Integer,
        runtime -> Integer,
        created_at -> Timestamp,
    }
}

diesel::joinable!(submissions -> users (user_id));
diesel::joinable!(submissions -> problems (problem_id));
diesel::joinable!(testcases -> problems (problem_id));

diesel::allow_tables_to_appear_in_same_query!(users, contests, problems, testcases, submissions,);
