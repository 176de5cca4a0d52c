//! Raw source contents shared by the end-to-end tests.
//!
//! Customers: C003 has a malformed email, C004 repeats C001's email.
//! Products: P002 has a negative price, P003 no stock, P004 no price,
//! P001 appears twice.
//! Sales: T005 references the rejected customer, T006 and T008 the rejected
//! product, T003 appears twice.

#![allow(dead_code)]

pub const CUSTOMERS_CSV: &str = "\
customer_id,first_name,last_name,email,phone,city,registration_date
C001,Rahul,Sharma,Rahul.Sharma@gmail.com,9876543210,mumbai,2023-01-15
C002,Priya,Patel,priya.patel@yahoo.com,+91 98765 43211,Delhi,15/02/2023
C003,Amit,Kumar,not-an-email,9876543212,Bangalore,2023-03-10
C004,Rahul,Sharma,rahul.sharma@gmail.com,,Mumbai,2023-01-15
C005,Sneha,Reddy,sneha.reddy@gmail.com,98765-43214,hyderabad,03-20-2023
";

pub const PRODUCTS_CSV: &str = "\
product_id,product_name,category,price,stock_quantity
P001,Laptop,Electronics,45000.00,50
P002,Mouse,electronics,-500,200
P003,T-Shirt,Fashion,799.50,
P004,Rice 5kg,Groceries,,100
P001,Laptop Pro,Electronics,47000,45
";

pub const SALES_CSV: &str = "\
transaction_id,customer_id,product_id,quantity,unit_price,transaction_date,status
T001,C001,P001,1,45000.00,2024-01-10,completed
T002,C001,P003,2,799.50,2024-01-10,completed
T003,C002,P004,3,450,2024-02-05,pending
T004,C004,P001,1,46000,2024-02-20,Completed
T005,C003,P003,1,799.50,2024-03-01,completed
T006,C005,P002,1,500,2024-03-02,completed
T007,C005,P004,2,450,2024-03-02,shipped
T008,C002,P002,1,500,2024-03-15,completed
T003,C002,P004,4,450,2024-02-05,pending
";

pub const DOCUMENTS_JSON: &str = r#"[
    {
        "product_id": "ELEC001",
        "name": "Smartphone X",
        "category": "Electronics",
        "price": 24999,
        "stock": 10,
        "specs": {"ram": "8GB"},
        "reviews": [
            {"user": "U1", "rating": 5, "comment": "Great", "date": "2024-01-02"},
            {"user": "U2", "rating": 4, "date": "2024-01-05"}
        ]
    },
    {
        "product_id": "GROC001",
        "name": "Basmati Rice",
        "category": "Groceries",
        "price": "649.00",
        "stock": 300,
        "reviews": [
            {"user": "U3", "rating": 2, "date": "2024-02-01"}
        ]
    },
    {
        "product_id": "GROC002",
        "name": "Bad Rating",
        "category": "Groceries",
        "price": 10,
        "reviews": [
            {"user": "U4", "rating": 9, "date": "2024-02-01"}
        ]
    }
]"#;

pub const LOADED_CUSTOMERS: usize = 3;
pub const LOADED_PRODUCTS: usize = 3;
pub const LOADED_ORDERS: usize = 4;
pub const LOADED_ORDER_ITEMS: usize = 5;
