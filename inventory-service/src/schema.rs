diesel::table! {
    products (id) {
        id -> Int4,
        name -> Varchar,
        description -> Nullable<Text>,
        quantity -> Int4,
        price -> Numeric,
        created_at -> Timestamptz,
    }
}
